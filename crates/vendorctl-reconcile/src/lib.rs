//! # vendorctl-reconcile
//!
//! Reconciles declared test clusters and customer licenses against the vendor
//! API and reflects remote truth back into persisted state.
//!
//! ```ignore
//! use vendorctl_reconcile::{ClusterSpec, ManagedResource, Provider};
//!
//! let provider = Provider::configure(&vendorctl_config::load_config(None)?)?;
//! let mut spec = ClusterSpec::new("kind");
//! spec.wait_duration = Some("10m".into());
//! let state = provider.clusters().create(&spec).await?;
//! ```

pub mod cluster;
pub mod customer;
pub mod error;
pub mod observability;
pub mod provider;
pub mod resource;
pub mod wait;

pub use cluster::{ClusterReconciler, ClusterSpec, ClusterState};
pub use customer::{CustomerReconciler, CustomerSpec, CustomerState, DEFAULT_LICENSE_TYPE};
pub use error::{ErrorCategory, ReconcileError, Result};
pub use provider::Provider;
pub use resource::{ManagedResource, ReadOutcome};
pub use wait::{Clock, ManualClock, POLL_INTERVAL, TokioClock, WaitState};
