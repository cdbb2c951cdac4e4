//! Shared building blocks for vendorctl: the customer composite id codec,
//! compact duration parsing and license expiry timestamps.

pub mod error;
pub mod id;
pub mod time;

pub use crate::error::{CoreError, ErrorCategory, Result};
pub use crate::id::{CompositeId, decode_customer_id, encode_customer_id};
pub use crate::time::{ExpiryTimestamp, format_expiry, parse_duration, parse_expiry};
