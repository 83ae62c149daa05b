//! Error types for the sync pipeline
//!
//! Nothing in the library exits the process. Every failure travels back to the
//! caller as a [`SyncError`], and the binary decides to log and halt.

use crate::category::Category;
use crate::source::PageKind;
use crate::stage::SyncStage;
use seisync_common::CommonError;
use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Login against the source API was refused or could not be sent
    #[error("Error authenticating: {0}")]
    Authentication(String),

    /// A page request failed or came back with a non-success status
    #[error("Error requesting {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// A schedule item points at a filing the cover pages never delivered
    #[error("Missing a filing record for id: {filing_id} ({category})")]
    Join { category: Category, filing_id: String },

    /// The catalog rejected a write or reported row-level errors
    #[error("Error updating {dataset} ({category}): {detail}")]
    Load {
        category: Category,
        dataset: String,
        detail: String,
    },

    /// The catalog answered a write with a non-success status
    #[error("Catalog rejected write to {dataset}: {detail}")]
    Catalog { dataset: String, detail: String },

    /// Counts disagree at a checkpoint
    #[error("Reconciliation failed before {stage}: {detail}")]
    Reconciliation { stage: SyncStage, detail: String },

    #[error("{category} record has no '{column}' field")]
    Projection { category: Category, column: String },

    #[error("Malformed {category} record: {detail}")]
    MalformedRecord { category: Category, detail: String },

    #[error("Malformed {kind} page {page}: {detail}")]
    MalformedPage {
        kind: PageKind,
        page: u32,
        detail: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl SyncError {
    pub fn malformed(category: Category, detail: impl Into<String>) -> Self {
        Self::MalformedRecord {
            category,
            detail: detail.into(),
        }
    }

    /// Whether the failure came from a count check rather than a request
    pub fn is_reconciliation(&self) -> bool {
        matches!(self, SyncError::Reconciliation { .. })
    }
}
