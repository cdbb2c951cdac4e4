//! # vendorctl-api
//!
//! Gateway to the vendor REST API.
//!
//! The reconcilers depend only on the [`VendorApi`] trait. [`HttpVendorApi`]
//! is the production implementation; tests substitute a scripted one.
//!
//! ## Error classification
//!
//! Every implementation reports a missing remote object as
//! [`ApiError::NotFound`]. The HTTP client maps both a 404 status and the
//! legacy `"Customer not found"` error body to that variant, so callers never
//! compare message strings.

pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use error::{ApiError, ErrorCategory};
pub use http::{DEFAULT_ENDPOINT, HttpVendorApi};
pub use traits::VendorApi;
pub use types::{
    ChannelAssignment, Cluster, ClusterCreation, ClusterStatus, CreateClusterOpts,
    CustomerChannel, CustomerOpts, CustomerRecord, EntitlementValue, LicenseFlags,
    ProvisionPhase, ValidationFeedback,
};
