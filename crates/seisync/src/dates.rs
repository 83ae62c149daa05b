//! Date normalization
//!
//! The catalog wants `YYYY-MM-DDTHH:mm:ss`. The source hands back three
//! different shapes:
//!
//! - fixed-width timestamps with fractional seconds and an offset,
//!   `YYYY-MM-DDTHH:mm:ss.fffffff-HH:mm` (always 33 characters)
//! - hand-typed `M/D/YYYY` dates
//! - anything else, which is passed through untouched

use crate::error::Result;
use regex::Regex;
use serde_json::Value;

/// Character length of the source's timestamp-with-offset format
pub const SOURCE_TIMESTAMP_LEN: usize = 33;

/// Characters kept from a source timestamp (`YYYY-MM-DDTHH:mm:ss`)
pub const CATALOG_TIMESTAMP_LEN: usize = 19;

#[derive(Debug, Clone)]
pub struct DateNormalizer {
    user_entered: Regex,
}

impl DateNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            user_entered: Regex::new(r"^(\d+)/(\d+)/(\d{4})\n?$")?,
        })
    }

    /// Normalize a JSON date value.
    ///
    /// Null and empty strings become null. Non-string values are returned as-is.
    pub fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::String(raw) => self
                .normalize_str(raw)
                .map(Value::String)
                .unwrap_or(Value::Null),
            other => other.clone(),
        }
    }

    pub fn normalize_str(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }

        if let Some(mdy) = self.user_entered.captures(raw) {
            return Some(format!("{}-{:0>2}-{:0>2}", &mdy[3], &mdy[1], &mdy[2]));
        }

        if raw.chars().count() != SOURCE_TIMESTAMP_LEN {
            return Some(raw.to_string());
        }

        Some(raw.chars().take(CATALOG_TIMESTAMP_LEN).collect())
    }
}
