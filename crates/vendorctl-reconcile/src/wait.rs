//! Bounded polling until a freshly created cluster settles.
//!
//! The loop is split into a pure transition function, [`next_state`], and a
//! driver, [`wait_for_cluster`], that owns the remote calls and the sleeping.
//! Time comes from a [`Clock`] so tests can advance it without real delays.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use vendorctl_api::{Cluster, ProvisionPhase, VendorApi};

use crate::error::{ReconcileError, Result};

/// Delay between two polls. No backoff and no jitter.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Source of time for the wait loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when slept on. Sleeping returns immediately.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Total simulated time slept so far.
    pub fn elapsed(&self) -> Duration {
        match self.offset.lock() {
            Ok(offset) => *offset,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut offset = match self.offset.lock() {
            Ok(offset) => offset,
            Err(poisoned) => poisoned.into_inner(),
        };
        *offset += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// States of the wait protocol. Everything but `Polling` is terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitState {
    Polling,
    Ready(Cluster),
    Failed(Cluster),
    /// Deadline passed while still provisioning. Not an error.
    TimedOut(Cluster),
}

impl WaitState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// Evaluates one poll result.
///
/// Status decides first, so a cluster that turns ready exactly as the deadline
/// passes is still reported ready.
pub fn next_state(cluster: Cluster, elapsed: Duration, limit: Duration) -> WaitState {
    match cluster.status.phase() {
        ProvisionPhase::Ready => WaitState::Ready(cluster),
        ProvisionPhase::Failed => WaitState::Failed(cluster),
        ProvisionPhase::InProgress if elapsed > limit => WaitState::TimedOut(cluster),
        ProvisionPhase::InProgress => WaitState::Polling,
    }
}

/// Polls `cluster_id` until it is ready, fails, or `limit` has elapsed.
///
/// Returns [`WaitState::Ready`] or [`WaitState::TimedOut`]. A failed cluster
/// becomes [`ReconcileError::ProvisionFailure`]; any gateway error aborts the
/// wait immediately.
pub async fn wait_for_cluster(
    api: &dyn VendorApi,
    clock: &dyn Clock,
    cluster_id: &str,
    limit: Duration,
) -> Result<WaitState> {
    let started = clock.now();
    let mut polls = 0u32;

    loop {
        let cluster = api.get_cluster(cluster_id).await?;
        polls += 1;
        let elapsed = clock.now().saturating_duration_since(started);

        match next_state(cluster, elapsed, limit) {
            WaitState::Polling => {
                tracing::debug!(cluster_id, polls, ?elapsed, "cluster still provisioning");
                clock.sleep(POLL_INTERVAL).await;
            }
            WaitState::Failed(cluster) => {
                tracing::error!(cluster_id, status = %cluster.status, "cluster failed to provision");
                return Err(ReconcileError::ProvisionFailure {
                    cluster_id: cluster.id,
                    status: cluster.status,
                });
            }
            WaitState::TimedOut(cluster) => {
                tracing::warn!(
                    cluster_id,
                    status = %cluster.status,
                    ?elapsed,
                    "wait duration elapsed before cluster was ready"
                );
                return Ok(WaitState::TimedOut(cluster));
            }
            ready => {
                tracing::info!(cluster_id, polls, ?elapsed, "cluster is running");
                return Ok(ready);
            }
        }
    }
}
