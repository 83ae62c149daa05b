//! Configuration management
//!
//! Everything a run needs is gathered into one [`SyncConfig`] up front and
//! handed to the pipeline by value. Values come from the environment (after
//! loading an optional `.env` file).

use crate::category::Category;
use crate::error::{Result, SyncError};
use crate::source::DEFAULT_PAGE_SIZE;
use seisync_common::env;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default NetFile host.
pub const DEFAULT_NETFILE_BASE_URL: &str = "https://netfile.com:443";

/// Default filing agency.
pub const DEFAULT_AGENCY_PREFIX: &str = "SFO";

/// Default Socrata domain.
pub const DEFAULT_SOCRATA_BASE_URL: &str = "https://data.sfgov.org";

/// Default timeout for every HTTP request in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Rows per catalog write.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Which view of the filings to sync. Each variant publishes to its own datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Redacted,
    Unredacted,
}

impl Variant {
    pub fn is_redacted(self) -> bool {
        matches!(self, Variant::Redacted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Redacted => "redacted",
            Variant::Unredacted => "unredacted",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username/password pair. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NetfileConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub agency_prefix: String,
    pub page_size: u32,
}

#[derive(Debug, Clone)]
pub struct SocrataConfig {
    pub base_url: String,
    /// API key id and secret
    pub credentials: Credentials,
    pub app_token: String,
}

/// Catalog dataset id for every category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetMap {
    // indexed by Category::index()
    ids: Vec<String>,
}

impl DatasetMap {
    pub fn new<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Category, S)>,
        S: Into<String>,
    {
        let mut slots: Vec<Option<String>> = vec![None; Category::ALL.len()];
        for (category, id) in ids {
            let id = id.into();
            if id.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "dataset id for {} is blank",
                    category
                )));
            }
            slots[category.index()] = Some(id);
        }

        let ids = Category::ALL
            .into_iter()
            .zip(slots)
            .map(|(category, slot)| {
                slot.ok_or_else(|| SyncError::Config(format!("no dataset id for {}", category)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { ids })
    }

    /// Parse `{"cover": "abcd-1234", ...}`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let ids = map
            .into_iter()
            .map(|(name, id)| {
                let category: Category = name.parse().map_err(|_| {
                    SyncError::Config(format!("unknown dataset category '{}'", name))
                })?;
                match id {
                    serde_json::Value::String(id) => Ok((category, id)),
                    other => Err(SyncError::Config(format!(
                        "dataset id for {} must be a string, got {}",
                        category, other
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(ids)
    }

    pub fn get(&self, category: Category) -> &str {
        &self.ids[category.index()]
    }
}

/// Sync configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub netfile: NetfileConfig,
    pub socrata: SocrataConfig,
    pub datasets_redacted: DatasetMap,
    pub datasets_unredacted: DatasetMap,
    /// JSON file with the per-category column definitions
    pub schema_path: PathBuf,
    pub http_timeout_secs: u64,
    pub chunk_size: usize,
}

impl SyncConfig {
    /// Load configuration from `.env` and the environment
    ///
    /// Required: `NETFILE_LOGIN`, `NETFILE_PASSWORD`, `SOCRATA_KEY_ID`,
    /// `SOCRATA_KEY_SECRET`, `SOCRATA_APP_TOKEN`, `SOCRATA_DATASETS_REDACTED`,
    /// `SOCRATA_DATASETS_UNREDACTED`, `SEI_SCHEMA_PATH`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = SyncConfig {
            netfile: NetfileConfig {
                base_url: env::var_or("NETFILE_BASE_URL", DEFAULT_NETFILE_BASE_URL),
                credentials: Credentials::new(
                    env::require("NETFILE_LOGIN")?,
                    env::require("NETFILE_PASSWORD")?,
                ),
                agency_prefix: env::var_or("NETFILE_AGENCY_PREFIX", DEFAULT_AGENCY_PREFIX),
                page_size: DEFAULT_PAGE_SIZE,
            },
            socrata: SocrataConfig {
                base_url: env::var_or("SOCRATA_BASE_URL", DEFAULT_SOCRATA_BASE_URL),
                credentials: Credentials::new(
                    env::require("SOCRATA_KEY_ID")?,
                    env::require("SOCRATA_KEY_SECRET")?,
                ),
                app_token: env::require("SOCRATA_APP_TOKEN")?,
            },
            datasets_redacted: DatasetMap::from_json_str(&env::require(
                "SOCRATA_DATASETS_REDACTED",
            )?)?,
            datasets_unredacted: DatasetMap::from_json_str(&env::require(
                "SOCRATA_DATASETS_UNREDACTED",
            )?)?,
            schema_path: PathBuf::from(env::require("SEI_SCHEMA_PATH")?),
            http_timeout_secs: env::parse_or("SEI_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            chunk_size: DEFAULT_CHUNK_SIZE,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.netfile.credentials.is_complete() {
            return Err(SyncError::Config("NetFile login and password are required".into()));
        }

        if !self.socrata.credentials.is_complete() || self.socrata.app_token.trim().is_empty() {
            return Err(SyncError::Config(
                "Socrata key id, key secret and app token are required".into(),
            ));
        }

        if self.netfile.agency_prefix.trim().is_empty() {
            return Err(SyncError::Config("Agency prefix cannot be empty".into()));
        }

        if self.netfile.page_size == 0 {
            return Err(SyncError::Config("Page size must be greater than 0".into()));
        }

        if self.chunk_size == 0 {
            return Err(SyncError::Config("Chunk size must be greater than 0".into()));
        }

        if self.http_timeout_secs == 0 {
            return Err(SyncError::Config("HTTP timeout must be greater than 0".into()));
        }

        Ok(())
    }

    pub fn datasets(&self, variant: Variant) -> &DatasetMap {
        match variant {
            Variant::Redacted => &self.datasets_redacted,
            Variant::Unredacted => &self.datasets_unredacted,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
