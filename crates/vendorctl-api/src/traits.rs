//! Gateway trait for the vendor REST API.
//!
//! Reconcilers talk to the vendor exclusively through [`VendorApi`], so tests
//! can substitute a scripted implementation for the HTTP client.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{Cluster, ClusterCreation, CreateClusterOpts, CustomerOpts, CustomerRecord};

/// Remote operations the reconcilers need.
///
/// Implementations must classify "object does not exist" responses as
/// [`ApiError::NotFound`]; callers never inspect message text.
///
/// # Example
///
/// ```ignore
/// use vendorctl_api::{ApiError, VendorApi};
///
/// async fn is_running(api: &dyn VendorApi, id: &str) -> Result<bool, ApiError> {
///     Ok(api.get_cluster(id).await?.status.is_running())
/// }
/// ```
#[async_trait]
pub trait VendorApi: Send + Sync {
    // ==================== Clusters ====================

    /// Requests a new test cluster.
    ///
    /// A successful call may still carry validation feedback, with or
    /// without a created cluster.
    async fn create_cluster(&self, opts: &CreateClusterOpts) -> Result<ClusterCreation, ApiError>;

    /// Fetches a cluster by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the cluster does not exist.
    async fn get_cluster(&self, id: &str) -> Result<Cluster, ApiError>;

    /// Fetches the decoded kubeconfig bytes of a running cluster.
    async fn get_cluster_kubeconfig(&self, id: &str) -> Result<Vec<u8>, ApiError>;

    /// Removes a cluster.
    async fn remove_cluster(&self, id: &str) -> Result<(), ApiError>;

    // ==================== Customers ====================

    /// Creates a customer.
    async fn create_customer(&self, opts: &CustomerOpts) -> Result<CustomerRecord, ApiError>;

    /// Fetches a customer scoped to its owning app.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the customer does not exist.
    async fn get_customer(&self, app_id: &str, id: &str) -> Result<CustomerRecord, ApiError>;

    /// Replaces every mutable field of a customer.
    async fn update_customer(
        &self,
        id: &str,
        opts: &CustomerOpts,
    ) -> Result<CustomerRecord, ApiError>;

    /// Archives a customer. Archival is the only removal the vendor offers.
    async fn archive_customer(&self, id: &str) -> Result<(), ApiError>;

    // ==================== Metadata ====================

    /// Returns the name of this gateway implementation.
    fn backend_name(&self) -> &'static str;
}
