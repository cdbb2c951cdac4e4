//! Customer (license) reconciliation.
//!
//! Customers are addressed by a composite id so that Read can reach the
//! app-scoped endpoint. Every write is a full replace: the reconciler always
//! sends the complete declared object and rebuilds state from the response.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use vendorctl_api::{
    ChannelAssignment, CustomerOpts, CustomerRecord, EntitlementValue, LicenseFlags, VendorApi,
};
use vendorctl_core::{CompositeId, format_expiry, parse_expiry};

use crate::error::{ReconcileError, Result};
use crate::resource::{ManagedResource, ReadOutcome};

pub const DEFAULT_LICENSE_TYPE: &str = "trial";

/// Declared configuration for a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSpec {
    pub app_id: String,
    pub channel_id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Entitlement name to value. Insertion order is the send order.
    #[serde(default)]
    pub entitlement_values: IndexMap<String, String>,
    /// RFC 3339 expiry.
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub license_type: Option<String>,
    #[serde(flatten)]
    pub flags: LicenseFlags,
}

impl CustomerSpec {
    pub fn new(
        app_id: impl Into<String>,
        channel_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            channel_id: channel_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Persisted customer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerState {
    /// `app/{app_id}/customer/{customer_id}`
    pub id: String,
    pub app_id: String,
    pub channel_id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub entitlement_values: IndexMap<String, String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    pub license_type: String,
    #[serde(flatten)]
    pub flags: LicenseFlags,
}

impl CustomerState {
    /// Remote customer id, decoded from the composite id.
    pub fn customer_id(&self) -> Result<String> {
        Ok(CompositeId::decode(&self.id)?.customer_id().to_string())
    }
}

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReconcileError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Flattens the declared entitlement map into the request list.
pub fn entitlement_list(values: &IndexMap<String, String>) -> Vec<EntitlementValue> {
    values
        .iter()
        .map(|(name, value)| EntitlementValue {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Folds a remote entitlement list into a map. Duplicate names keep the
/// last value.
pub fn entitlement_map(values: &[EntitlementValue]) -> IndexMap<String, String> {
    let mut map = IndexMap::with_capacity(values.len());
    for entitlement in values {
        map.insert(entitlement.name.clone(), entitlement.value.clone());
    }
    map
}

/// Builds the full-replace request body, validating input first.
fn customer_opts(spec: &CustomerSpec) -> Result<CustomerOpts> {
    required("app_id", &spec.app_id)?;
    required("channel_id", &spec.channel_id)?;
    required("name", &spec.name)?;

    let expires_at = parse_expiry(spec.expires_at.as_deref().unwrap_or_default())?
        .map(|expiry| format_expiry(&expiry))
        .unwrap_or_default();
    let license_type = spec
        .license_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_LICENSE_TYPE)
        .to_string();

    Ok(CustomerOpts {
        name: spec.name.clone(),
        app_id: spec.app_id.clone(),
        channels: vec![ChannelAssignment {
            channel_id: spec.channel_id.clone(),
        }],
        email: spec.email.clone(),
        expires_at,
        license_type,
        entitlement_values: entitlement_list(&spec.entitlement_values),
        flags: spec.flags,
    })
}

/// Rebuilds state from an authoritative record.
///
/// `app_id_hint` is used when the first channel does not name its app.
/// `keep_id` pins the composite id instead of deriving it.
fn state_from_record(
    record: &CustomerRecord,
    app_id_hint: &str,
    keep_id: Option<&str>,
) -> Result<CustomerState> {
    let channel = record.channels.first().ok_or_else(|| {
        ReconcileError::malformed_response(format!("customer {} has no channels", record.id))
    })?;
    let app_id = if channel.app_id.is_empty() {
        app_id_hint.to_string()
    } else {
        channel.app_id.clone()
    };

    let id = match keep_id {
        Some(id) => id.to_string(),
        None => CompositeId::new(app_id.as_str(), record.id.as_str())
            .map_err(|e| ReconcileError::malformed_response(e.to_string()))?
            .to_string(),
    };

    Ok(CustomerState {
        id,
        app_id,
        channel_id: channel.id.clone(),
        name: record.name.clone(),
        email: record.email.clone(),
        entitlement_values: entitlement_map(&record.entitlements),
        expires_at: record.expires_at.as_ref().map(format_expiry),
        license_type: record.license_type.clone(),
        flags: record.flags(),
    })
}

/// Reconciles [`CustomerSpec`] against the vendor customer API.
#[derive(Clone)]
pub struct CustomerReconciler {
    api: Arc<dyn VendorApi>,
}

impl CustomerReconciler {
    pub fn new(api: Arc<dyn VendorApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ManagedResource for CustomerReconciler {
    type Spec = CustomerSpec;
    type State = CustomerState;

    const TYPE_NAME: &'static str = "customer";

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, app_id = %spec.app_id))]
    async fn create(&self, spec: &CustomerSpec) -> Result<CustomerState> {
        let opts = customer_opts(spec)?;
        let record = self.api.create_customer(&opts).await?;
        let state = state_from_record(&record, &spec.app_id, None)?;
        tracing::info!(customer_id = %record.id, id = %state.id, "customer created");
        Ok(state)
    }

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, id = %prior.id))]
    async fn read(&self, prior: &CustomerState) -> Result<ReadOutcome<CustomerState>> {
        let id = CompositeId::decode(&prior.id)?;

        let record = match self.api.get_customer(id.app_id(), id.customer_id()).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                tracing::warn!("customer no longer exists, removing from state");
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => return Err(e.into()),
        };

        state_from_record(&record, id.app_id(), None).map(ReadOutcome::Present)
    }

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, id = %prior.id))]
    async fn update(&self, spec: &CustomerSpec, prior: &CustomerState) -> Result<CustomerState> {
        let id = CompositeId::decode(&prior.id)?;
        let opts = customer_opts(spec)?;

        let record = self.api.update_customer(id.customer_id(), &opts).await?;
        tracing::info!(customer_id = id.customer_id(), "customer updated");
        state_from_record(&record, id.app_id(), Some(prior.id.as_str()))
    }

    #[instrument(skip_all, fields(resource = Self::TYPE_NAME, id = %prior.id))]
    async fn delete(&self, prior: &CustomerState) -> Result<()> {
        let id = CompositeId::decode(&prior.id)?;
        self.api.archive_customer(id.customer_id()).await?;
        tracing::info!(customer_id = id.customer_id(), "customer archived");
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<ReadOutcome<CustomerState>> {
        let decoded = CompositeId::decode(id)?;
        let prior = CustomerState {
            id: decoded.to_string(),
            app_id: decoded.app_id().to_string(),
            ..CustomerState::default()
        };
        self.read(&prior).await
    }
}
