//! Open-data catalog
//!
//! The loader writes rows to the catalog in chunks. A chunk either replaces
//! the whole remote dataset or upserts into it, and the catalog answers with
//! row counts the loader reconciles against what it sent.

pub mod socrata;

pub use socrata::SocrataClient;

use crate::error::Result;
use crate::schema::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop all existing rows, then write this chunk
    Replace,
    /// Insert or update by row identifier
    Upsert,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Replace => f.write_str("replace"),
            WriteMode::Upsert => f.write_str("upsert"),
        }
    }
}

/// Catalog response to a write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    #[serde(rename = "Errors", default)]
    pub errors: u64,
    #[serde(rename = "Rows Created", default)]
    pub rows_created: u64,
    #[serde(rename = "Rows Updated", default)]
    pub rows_updated: u64,
    #[serde(rename = "Rows Deleted", default)]
    pub rows_deleted: u64,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn write(&self, dataset: &str, rows: &[Row], mode: WriteMode) -> Result<WriteResult>;
}
