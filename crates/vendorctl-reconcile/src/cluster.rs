//! Test cluster reconciliation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use vendorctl_api::{Cluster, CreateClusterOpts, VendorApi};
use vendorctl_core::{CoreError, parse_duration};

use crate::error::{ReconcileError, Result};
use crate::resource::{ManagedResource, ReadOutcome};
use crate::wait::{Clock, WaitState, wait_for_cluster};

/// Declared configuration for a cluster.
///
/// Unset optional fields are left for the vendor to default: a random name,
/// the latest version, 50 GiB of disk and a single node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSpec {
    pub distribution: String,
    pub name: Option<String>,
    pub version: Option<String>,
    pub instance_type: Option<String>,
    pub disk_gib: Option<i64>,
    pub nodes: Option<i64>,
    /// Time to live, e.g. `"1h"`. Sent to the vendor as given unless zero.
    pub ttl: Option<String>,
    /// How long Create waits for the cluster to run. Never sent.
    pub wait_duration: Option<String>,
}

impl ClusterSpec {
    pub fn new(distribution: impl Into<String>) -> Self {
        Self {
            distribution: distribution.into(),
            ..Self::default()
        }
    }
}

/// Persisted cluster state.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterState {
    pub id: String,
    pub name: String,
    pub distribution: String,
    pub version: String,
    pub instance_type: String,
    pub disk_gib: i64,
    pub nodes: i64,
    pub ttl: String,
    pub wait_duration: String,
    /// Non-empty only if the cluster was running when last read.
    pub kubeconfig: String,
}

impl fmt::Debug for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kubeconfig = if self.kubeconfig.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("ClusterState")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("distribution", &self.distribution)
            .field("version", &self.version)
            .field("instance_type", &self.instance_type)
            .field("disk_gib", &self.disk_gib)
            .field("nodes", &self.nodes)
            .field("ttl", &self.ttl)
            .field("wait_duration", &self.wait_duration)
            .field("kubeconfig", &kubeconfig)
            .finish()
    }
}

impl ClusterState {
    fn from_spec(spec: &ClusterSpec) -> Self {
        Self {
            id: String::new(),
            name: spec.name.clone().unwrap_or_default(),
            distribution: spec.distribution.clone(),
            version: spec.version.clone().unwrap_or_default(),
            instance_type: spec.instance_type.clone().unwrap_or_default(),
            disk_gib: spec.disk_gib.unwrap_or_default(),
            nodes: spec.nodes.unwrap_or_default(),
            ttl: spec.ttl.clone().unwrap_or_default(),
            wait_duration: spec.wait_duration.clone().unwrap_or_default(),
            kubeconfig: String::new(),
        }
    }

    /// Copies everything the vendor reports. `ttl` and `wait_duration` stay
    /// as declared.
    fn apply_remote(&mut self, cluster: &Cluster) {
        self.id.clone_from(&cluster.id);
        self.name.clone_from(&cluster.name);
        self.version.clone_from(&cluster.version);
        self.disk_gib = cluster.disk_gib;
        self.nodes = cluster.node_count;
        if !cluster.distribution.is_empty() {
            self.distribution.clone_from(&cluster.distribution);
        }
        if !cluster.instance_type.is_empty() {
            self.instance_type.clone_from(&cluster.instance_type);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

/// `ttl` is the parsed form of `spec.ttl`; a zero TTL is left to the vendor.
fn create_opts(spec: &ClusterSpec, ttl: Option<Duration>) -> CreateClusterOpts {
    CreateClusterOpts {
        name: non_empty(&spec.name),
        distribution: spec.distribution.trim().to_string(),
        version: non_empty(&spec.version),
        instance_type: non_empty(&spec.instance_type),
        node_count: positive(spec.nodes),
        disk_gib: positive(spec.disk_gib),
        ttl: ttl
            .filter(|d| !d.is_zero())
            .and_then(|_| non_empty(&spec.ttl)),
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(CoreError::malformed_identity(id, "cluster id is empty").into());
    }
    Ok(())
}

/// Reconciles [`ClusterSpec`] against the vendor cluster API.
#[derive(Clone)]
pub struct ClusterReconciler {
    api: Arc<dyn VendorApi>,
    clock: Arc<dyn Clock>,
}

impl ClusterReconciler {
    pub fn new(api: Arc<dyn VendorApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    async fn fetch_kubeconfig(&self, cluster_id: &str) -> Result<String> {
        let bytes = self.api.get_cluster_kubeconfig(cluster_id).await?;
        String::from_utf8(bytes).map_err(|e| {
            ReconcileError::malformed_response(format!(
                "kubeconfig for cluster {cluster_id} is not UTF-8: {e}"
            ))
        })
    }
}

#[async_trait]
impl ManagedResource for ClusterReconciler {
    type Spec = ClusterSpec;
    type State = ClusterState;

    const TYPE_NAME: &'static str = "cluster";

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, distribution = %spec.distribution))]
    async fn create(&self, spec: &ClusterSpec) -> Result<ClusterState> {
        if spec.distribution.trim().is_empty() {
            return Err(ReconcileError::validation("distribution is required"));
        }
        let ttl = parse_duration("ttl", spec.ttl.as_deref().unwrap_or_default())?;
        let wait = parse_duration("wait_duration", spec.wait_duration.as_deref().unwrap_or_default())?;

        let creation = self.api.create_cluster(&create_opts(spec, ttl)).await?;
        if let Some(feedback) = creation.validation {
            let created_id = creation.cluster.map(|c| c.id);
            tracing::warn!(
                created_id = created_id.as_deref().unwrap_or(""),
                "cluster request rejected: {feedback}"
            );
            return Err(ReconcileError::Validation {
                message: feedback.to_string(),
                created_id,
            });
        }
        let cluster = creation.cluster.ok_or_else(|| {
            ReconcileError::malformed_response("create returned neither a cluster nor feedback")
        })?;
        tracing::info!(cluster_id = %cluster.id, status = %cluster.status, "cluster created");

        let mut state = ClusterState::from_spec(spec);
        state.apply_remote(&cluster);

        let Some(limit) = wait.filter(|d| !d.is_zero()) else {
            return Ok(state);
        };

        match wait_for_cluster(self.api.as_ref(), self.clock.as_ref(), &cluster.id, limit).await? {
            WaitState::Ready(ready) => {
                state.apply_remote(&ready);
                state.kubeconfig = self.fetch_kubeconfig(&ready.id).await?;
            }
            WaitState::TimedOut(last) => state.apply_remote(&last),
            WaitState::Polling | WaitState::Failed(_) => {}
        }
        Ok(state)
    }

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, cluster_id = %prior.id))]
    async fn read(&self, prior: &ClusterState) -> Result<ReadOutcome<ClusterState>> {
        require_id(&prior.id)?;

        let cluster = match self.api.get_cluster(&prior.id).await {
            Ok(cluster) => cluster,
            Err(e) if e.is_not_found() => {
                tracing::warn!("cluster no longer exists, removing from state");
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = prior.clone();
        state.apply_remote(&cluster);
        state.kubeconfig = if cluster.status.is_running() {
            self.fetch_kubeconfig(&cluster.id).await?
        } else {
            String::new()
        };
        Ok(ReadOutcome::Present(state))
    }

    /// Cluster shape cannot change in place, so nothing is sent.
    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, cluster_id = %prior.id))]
    async fn update(&self, spec: &ClusterSpec, prior: &ClusterState) -> Result<ClusterState> {
        parse_duration("ttl", spec.ttl.as_deref().unwrap_or_default())?;
        parse_duration("wait_duration", spec.wait_duration.as_deref().unwrap_or_default())?;

        let mut state = prior.clone();
        if let Some(name) = non_empty(&spec.name) {
            state.name = name;
        }
        if let Some(version) = non_empty(&spec.version) {
            state.version = version;
        }
        if let Some(instance_type) = non_empty(&spec.instance_type) {
            state.instance_type = instance_type;
        }
        if let Some(disk_gib) = positive(spec.disk_gib) {
            state.disk_gib = disk_gib;
        }
        if let Some(nodes) = positive(spec.nodes) {
            state.nodes = nodes;
        }
        state.ttl = spec.ttl.clone().unwrap_or_default();
        state.wait_duration = spec.wait_duration.clone().unwrap_or_default();

        tracing::debug!("cluster update is local only; no remote call made");
        Ok(state)
    }

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, cluster_id = %prior.id))]
    async fn delete(&self, prior: &ClusterState) -> Result<()> {
        require_id(&prior.id)?;
        self.api.remove_cluster(&prior.id).await?;
        tracing::info!("cluster removed");
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<ReadOutcome<ClusterState>> {
        let prior = ClusterState {
            id: id.to_string(),
            ..ClusterState::default()
        };
        self.read(&prior).await
    }
}
