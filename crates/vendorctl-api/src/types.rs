//! Wire types exchanged with the vendor REST API.
//!
//! Cluster payloads use snake_case field names, customer records come back
//! in camelCase while customer request payloads are snake_case. The serde
//! attributes below pin each name explicitly.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use vendorctl_core::ExpiryTimestamp;

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

/// Lifecycle status reported for a test cluster.
///
/// Unknown strings are kept verbatim in [`ClusterStatus::Other`] and treated
/// as still provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterStatus {
    Queued,
    Verifying,
    Assigned,
    Preparing,
    Provisioning,
    Running,
    Upgrading,
    UpgradeError,
    Error,
    Deleting,
    Terminated,
    #[default]
    Unknown,
    Other(String),
}

/// Coarse classification of a [`ClusterStatus`] for the wait protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionPhase {
    /// The cluster is usable and its kubeconfig can be fetched.
    Ready,
    /// Provisioning failed; waiting longer will not help.
    Failed,
    /// Anything else.
    InProgress,
}

impl ClusterStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Verifying => "verifying",
            Self::Assigned => "assigned",
            Self::Preparing => "preparing",
            Self::Provisioning => "provisioning",
            Self::Running => "running",
            Self::Upgrading => "upgrading",
            Self::UpgradeError => "upgrade_error",
            Self::Error => "error",
            Self::Deleting => "deleting",
            Self::Terminated => "terminated",
            Self::Unknown => "",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn phase(&self) -> ProvisionPhase {
        match self {
            Self::Running => ProvisionPhase::Ready,
            Self::Error | Self::UpgradeError => ProvisionPhase::Failed,
            _ => ProvisionPhase::InProgress,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl From<String> for ClusterStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => Self::Queued,
            "verifying" => Self::Verifying,
            "assigned" => Self::Assigned,
            "preparing" => Self::Preparing,
            "provisioning" => Self::Provisioning,
            "running" => Self::Running,
            "upgrading" => Self::Upgrading,
            "upgrade_error" => Self::UpgradeError,
            "error" => Self::Error,
            "deleting" => Self::Deleting,
            "terminated" => Self::Terminated,
            "" => Self::Unknown,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ClusterStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ClusterStatus> for String {
    fn from(status: ClusterStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test cluster as reported by the vendor API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "kubernetes_distribution", default)]
    pub distribution: String,
    #[serde(rename = "kubernetes_version", default)]
    pub version: String,
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub node_count: i64,
    #[serde(default)]
    pub disk_gib: i64,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default)]
    pub ttl: String,
}

impl Cluster {
    /// Minimal cluster with the given id and status; other fields empty.
    pub fn new(id: impl Into<String>, status: ClusterStatus) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            distribution: String::new(),
            version: String::new(),
            instance_type: String::new(),
            node_count: 0,
            disk_gib: 0,
            status,
            ttl: String::new(),
        }
    }
}

/// Request body for `POST /v3/cluster`. Only fields set to `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateClusterOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "kubernetes_distribution")]
    pub distribution: String,
    #[serde(rename = "kubernetes_version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_gib: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

/// Non-fatal feedback the vendor returns when a cluster request does not
/// satisfy its constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFeedback {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl fmt::Display for ValidationFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.message.is_empty(), self.errors.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.message, self.errors.join("; ")),
            (false, true) => f.write_str(&self.message),
            (true, _) => f.write_str(&self.errors.join("; ")),
        }
    }
}

/// Outcome of a create call: a cluster, validation feedback, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterCreation {
    pub cluster: Option<Cluster>,
    pub validation: Option<ValidationFeedback>,
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

/// Boolean license capabilities. Only installer support defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseFlags {
    pub is_airgap_enabled: bool,
    pub is_embedded_cluster_download_enabled: bool,
    pub is_geoaxis_supported: bool,
    pub is_gitops_supported: bool,
    #[serde(alias = "is_helmvm_download_enabled")]
    pub is_helm_vm_download_enabled: bool,
    pub is_identity_service_supported: bool,
    pub is_installer_support_enabled: bool,
    pub is_kots_install_enabled: bool,
    pub is_snapshot_supported: bool,
    pub is_support_bundle_upload_enabled: bool,
}

impl Default for LicenseFlags {
    fn default() -> Self {
        Self {
            is_airgap_enabled: false,
            is_embedded_cluster_download_enabled: false,
            is_geoaxis_supported: false,
            is_gitops_supported: false,
            is_helm_vm_download_enabled: false,
            is_identity_service_supported: false,
            is_installer_support_enabled: true,
            is_kots_install_enabled: false,
            is_snapshot_supported: false,
            is_support_bundle_upload_enabled: false,
        }
    }
}

/// A single named entitlement value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementValue {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Channel assignment sent with a customer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelAssignment {
    pub channel_id: String,
}

/// Request body shared by customer create and full-replace update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerOpts {
    pub name: String,
    pub app_id: String,
    pub channels: Vec<ChannelAssignment>,
    pub email: String,
    /// RFC 3339 expiry, empty for none.
    pub expires_at: String,
    #[serde(rename = "type")]
    pub license_type: String,
    #[serde(rename = "entitlementValues")]
    pub entitlement_values: Vec<EntitlementValue>,
    #[serde(flatten)]
    pub flags: LicenseFlags,
}

/// Channel as it appears on a customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerChannel {
    pub id: String,
    #[serde(rename = "appId", default)]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Customer record as returned by the vendor API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channels: Vec<CustomerChannel>,
    #[serde(default, deserialize_with = "lenient_expiry")]
    pub expires_at: Option<ExpiryTimestamp>,
    #[serde(rename = "type", default)]
    pub license_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entitlements: Vec<EntitlementValue>,
    #[serde(rename = "airgap", default)]
    pub is_airgap_enabled: bool,
    #[serde(default)]
    pub is_embedded_cluster_download_enabled: bool,
    #[serde(default)]
    pub is_geoaxis_supported: bool,
    #[serde(default)]
    pub is_gitops_supported: bool,
    #[serde(default)]
    pub is_helm_vm_download_enabled: bool,
    #[serde(default)]
    pub is_identity_service_supported: bool,
    #[serde(default)]
    pub is_installer_support_enabled: bool,
    #[serde(default)]
    pub is_kots_install_enabled: bool,
    #[serde(default)]
    pub is_snapshot_supported: bool,
    #[serde(default)]
    pub is_support_bundle_upload_enabled: bool,
    #[serde(default)]
    pub is_archived: bool,
}

impl CustomerRecord {
    /// Collects the record's capability booleans.
    pub fn flags(&self) -> LicenseFlags {
        LicenseFlags {
            is_airgap_enabled: self.is_airgap_enabled,
            is_embedded_cluster_download_enabled: self.is_embedded_cluster_download_enabled,
            is_geoaxis_supported: self.is_geoaxis_supported,
            is_gitops_supported: self.is_gitops_supported,
            is_helm_vm_download_enabled: self.is_helm_vm_download_enabled,
            is_identity_service_supported: self.is_identity_service_supported,
            is_installer_support_enabled: self.is_installer_support_enabled,
            is_kots_install_enabled: self.is_kots_install_enabled,
            is_snapshot_supported: self.is_snapshot_supported,
            is_support_bundle_upload_enabled: self.is_support_bundle_upload_enabled,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// The API reports "no expiry" as null, an empty string, or omits the field.
fn lenient_expiry<'de, D>(deserializer: D) -> Result<Option<ExpiryTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
