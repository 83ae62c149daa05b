//! Shared helpers for the integration tests

#![allow(dead_code)]

use seisync::category::Category;
use seisync::config::{
    Credentials, DatasetMap, NetfileConfig, SocrataConfig, SyncConfig, DEFAULT_CHUNK_SIZE,
};
use serde_json::Value;
use std::path::Path;

pub const SCHEMA_JSON: &str = include_str!("../fixtures/schema.json");
pub const COVER_PAGE_JSON: &str = include_str!("../fixtures/cover_page.json");
pub const SCHEDULE_PAGE_JSON: &str = include_str!("../fixtures/schedule_page.json");

pub const NETFILE_LOGIN: &str = "login";
pub const NETFILE_PASSWORD: &str = "secret";
pub const SOCRATA_KEY_ID: &str = "key-id";
pub const SOCRATA_KEY_SECRET: &str = "key-secret";
pub const SOCRATA_APP_TOKEN: &str = "app-token";

pub fn cover_page() -> Value {
    serde_json::from_str(COVER_PAGE_JSON).unwrap()
}

pub fn schedule_page() -> Value {
    serde_json::from_str(SCHEDULE_PAGE_JSON).unwrap()
}

pub fn netfile_config(base_url: &str) -> NetfileConfig {
    NetfileConfig {
        base_url: base_url.to_string(),
        credentials: Credentials::new(NETFILE_LOGIN, NETFILE_PASSWORD),
        agency_prefix: "SFO".to_string(),
        page_size: 1000,
    }
}

pub fn socrata_config(base_url: &str) -> SocrataConfig {
    SocrataConfig {
        base_url: base_url.to_string(),
        credentials: Credentials::new(SOCRATA_KEY_ID, SOCRATA_KEY_SECRET),
        app_token: SOCRATA_APP_TOKEN.to_string(),
    }
}

/// Dataset id `<prefix>-<category>` for every category
pub fn datasets(prefix: &str) -> DatasetMap {
    DatasetMap::new(
        Category::ALL
            .into_iter()
            .map(|c| (c, format!("{}-{}", prefix, c))),
    )
    .unwrap()
}

pub fn sync_config(netfile_url: &str, socrata_url: &str, schema_path: &Path) -> SyncConfig {
    SyncConfig {
        netfile: netfile_config(netfile_url),
        socrata: socrata_config(socrata_url),
        datasets_redacted: datasets("red"),
        datasets_unredacted: datasets("unred"),
        schema_path: schema_path.to_path_buf(),
        http_timeout_secs: 5,
        chunk_size: DEFAULT_CHUNK_SIZE,
    }
}
