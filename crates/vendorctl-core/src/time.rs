use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Unit suffixes the vendor accepts, with their length in nanoseconds.
const DURATION_UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("\u{b5}s", 1_000),
    ("\u{3bc}s", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

const MAX_DURATION_NANOS: u128 = i64::MAX as u128;

/// Fraction digits past this scale are below one nanosecond and ignored.
const MAX_FRACTION_SCALE: u128 = 1_000_000_000_000_000_000;

/// Parses a compact duration such as `30s`, `1.5h` or `1h30m`.
///
/// Only the vendor's grammar is accepted: one or more decimal numbers, each
/// followed by `ns`, `us`, `ms`, `s`, `m` or `h`. A bare `0` is allowed.
/// An empty string means the value was not declared and yields `None`.
pub fn parse_duration(field: &str, value: &str) -> Result<Option<Duration>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_segments(trimmed)
        .map(Some)
        .map_err(|reason| CoreError::invalid_duration(field, value, reason))
}

fn parse_segments(input: &str) -> std::result::Result<Duration, String> {
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err("negative durations are not allowed".to_string());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err("missing number".to_string());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("expected a number at '{rest}'"));
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_len);
        if unit.is_empty() {
            return Err(format!("missing unit after '{whole}'"));
        }
        let scale = DURATION_UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, nanos)| *nanos)
            .ok_or_else(|| format!("unknown unit '{unit}', expected ns, us, ms, s, m or h"))?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| "duration out of range".to_string())?
        };
        let mut fraction_value: u128 = 0;
        let mut fraction_scale: u128 = 1;
        for digit in fraction.bytes() {
            if fraction_scale >= MAX_FRACTION_SCALE {
                break;
            }
            fraction_value = fraction_value * 10 + u128::from(digit - b'0');
            fraction_scale *= 10;
        }

        total = whole
            .checked_mul(scale)
            .and_then(|nanos| nanos.checked_add(fraction_value * scale / fraction_scale))
            .and_then(|nanos| total.checked_add(nanos))
            .filter(|nanos| *nanos <= MAX_DURATION_NANOS)
            .ok_or_else(|| "duration out of range".to_string())?;
        rest = tail;
    }

    u64::try_from(total)
        .map(Duration::from_nanos)
        .map_err(|_| "duration out of range".to_string())
}

fn split_digits(input: &str) -> (&str, &str) {
    let len = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    input.split_at(len)
}

/// License expiry instant, persisted as `YYYY-MM-DDTHH:MM:SSZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpiryTimestamp(OffsetDateTime);

impl ExpiryTimestamp {
    /// Normalises to UTC and truncates to whole seconds, matching the
    /// persisted form.
    pub fn new(datetime: OffsetDateTime) -> Self {
        let utc = datetime.to_offset(UtcOffset::UTC);
        Self(utc - time::Duration::nanoseconds(i64::from(utc.nanosecond())))
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for ExpiryTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
            ))
            .map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for ExpiryTimestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s.trim(), &Rfc3339)
            .map_err(|e| CoreError::invalid_timestamp(s, e.to_string()))?;
        Ok(Self::new(datetime))
    }
}

impl Serialize for ExpiryTimestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExpiryTimestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ExpiryTimestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses an RFC 3339 expiry. Empty input means "no expiry".
pub fn parse_expiry(value: &str) -> Result<Option<ExpiryTimestamp>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    ExpiryTimestamp::from_str(value).map(Some)
}

/// Formats an expiry in the persisted form.
pub fn format_expiry(expiry: &ExpiryTimestamp) -> String {
    expiry.to_string()
}
