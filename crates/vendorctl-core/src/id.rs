//! Composite identity for customer records.
//!
//! A customer is addressed by the app that owns it and the id the vendor
//! assigned to it. Both travel together in persisted state as
//! `app/{app_id}/customer/{customer_id}`. The format is part of the persisted
//! state contract, so it must stay readable for ids written by earlier versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const APP_SEGMENT: &str = "app";
const CUSTOMER_SEGMENT: &str = "customer";
const SEGMENT_COUNT: usize = 4;

/// Parsed `app/{app_id}/customer/{customer_id}` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompositeId {
    app_id: String,
    customer_id: String,
}

impl CompositeId {
    /// Builds an id from its two components.
    ///
    /// Components must be non-empty and free of `/`, otherwise the encoded
    /// string could not be decoded back into the same pair.
    pub fn new(app_id: impl Into<String>, customer_id: impl Into<String>) -> Result<Self> {
        let app_id = app_id.into();
        let customer_id = customer_id.into();
        let candidate = format!("{APP_SEGMENT}/{app_id}/{CUSTOMER_SEGMENT}/{customer_id}");

        for (name, value) in [("app id", &app_id), ("customer id", &customer_id)] {
            if value.is_empty() {
                return Err(CoreError::malformed_identity(
                    candidate,
                    format!("{name} is empty"),
                ));
            }
            if value.contains('/') {
                return Err(CoreError::malformed_identity(
                    candidate,
                    format!("{name} contains '/'"),
                ));
            }
        }

        Ok(Self {
            app_id,
            customer_id,
        })
    }

    /// Parses a persisted id. Never truncates or fills in missing segments.
    pub fn decode(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.split('/').collect();
        let [prefix, app_id, kind, customer_id] = segments.as_slice() else {
            return Err(CoreError::malformed_identity(
                raw,
                format!(
                    "expected {SEGMENT_COUNT} '/'-delimited segments, found {}",
                    segments.len()
                ),
            ));
        };

        if *prefix != APP_SEGMENT {
            return Err(CoreError::malformed_identity(
                raw,
                format!("segment 0 must be '{APP_SEGMENT}', found '{prefix}'"),
            ));
        }
        if *kind != CUSTOMER_SEGMENT {
            return Err(CoreError::malformed_identity(
                raw,
                format!("segment 2 must be '{CUSTOMER_SEGMENT}', found '{kind}'"),
            ));
        }
        if app_id.is_empty() {
            return Err(CoreError::malformed_identity(raw, "app id segment is empty"));
        }
        if customer_id.is_empty() {
            return Err(CoreError::malformed_identity(
                raw,
                "customer id segment is empty",
            ));
        }

        Ok(Self {
            app_id: (*app_id).to_string(),
            customer_id: (*customer_id).to_string(),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn into_parts(self) -> (String, String) {
        (self.app_id, self.customer_id)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{APP_SEGMENT}/{}/{CUSTOMER_SEGMENT}/{}",
            self.app_id, self.customer_id
        )
    }
}

impl FromStr for CompositeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl TryFrom<String> for CompositeId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::decode(&value)
    }
}

impl From<CompositeId> for String {
    fn from(id: CompositeId) -> Self {
        id.to_string()
    }
}

/// Encodes `(app_id, customer_id)` into the persisted string form.
pub fn encode_customer_id(app_id: &str, customer_id: &str) -> Result<String> {
    CompositeId::new(app_id, customer_id).map(|id| id.to_string())
}

/// Decodes the persisted string form into `(app_id, customer_id)`.
pub fn decode_customer_id(raw: &str) -> Result<(String, String)> {
    CompositeId::decode(raw).map(CompositeId::into_parts)
}
