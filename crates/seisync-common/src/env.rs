//! Typed environment variable lookups
//!
//! Blank values are treated the same as unset ones, so an empty line in a
//! `.env` file falls back to the default instead of producing garbage.

use crate::error::{CommonError, Result};
use std::str::FromStr;

fn lookup(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Value of `name`, or `default` when unset.
pub fn var_or(name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

/// Value of `name`, or `None` when unset.
pub fn var_opt(name: &str) -> Option<String> {
    lookup(name)
}

/// Value of `name`; unset is an error.
pub fn require(name: &str) -> Result<String> {
    lookup(name).ok_or_else(|| CommonError::MissingEnv(name.to_string()))
}

/// Parse `name` into `T`, falling back to `default` when unset.
///
/// A value that is present but does not parse is an error rather than a
/// silent fallback.
pub fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.parse().map_err(|e| CommonError::invalid(name, e)),
        None => Ok(default),
    }
}

/// Boolean flag; anything other than a recognised truthy/falsy word keeps the default.
pub fn flag(name: &str, default: bool) -> bool {
    match lookup(name).map(|v| v.to_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_blank_falls_back() {
        std::env::set_var("SEISYNC_TEST_BLANK", "   ");
        assert_eq!(var_or("SEISYNC_TEST_BLANK", "fallback"), "fallback");
        std::env::remove_var("SEISYNC_TEST_BLANK");
    }

    #[test]
    fn test_require_missing() {
        let err = require("SEISYNC_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(
            err,
            CommonError::MissingEnv(name) if name == "SEISYNC_TEST_DEFINITELY_UNSET"
        ));
    }

    #[test]
    fn test_parse_or() {
        std::env::set_var("SEISYNC_TEST_TIMEOUT", "42");
        assert_eq!(parse_or::<u64>("SEISYNC_TEST_TIMEOUT", 7).unwrap(), 42);
        std::env::set_var("SEISYNC_TEST_TIMEOUT", "forty-two");
        assert!(parse_or::<u64>("SEISYNC_TEST_TIMEOUT", 7).is_err());
        std::env::remove_var("SEISYNC_TEST_TIMEOUT");
        assert_eq!(parse_or::<u64>("SEISYNC_TEST_TIMEOUT", 7).unwrap(), 7);
    }

    #[test]
    fn test_flag() {
        std::env::set_var("SEISYNC_TEST_FLAG", "Yes");
        assert!(flag("SEISYNC_TEST_FLAG", false));
        std::env::set_var("SEISYNC_TEST_FLAG", "maybe");
        assert!(!flag("SEISYNC_TEST_FLAG", false));
        std::env::remove_var("SEISYNC_TEST_FLAG");
    }
}
