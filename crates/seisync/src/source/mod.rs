//! Source filing API
//!
//! The extractor only needs two capabilities from the source: log in once, then
//! fetch numbered pages of cover or schedule records. [`SourceApi`] captures
//! that so the pipeline can run against the real NetFile client or an
//! in-memory fake.

pub mod netfile;

pub use netfile::NetfileClient;

use crate::error::{Result, SyncError};
use crate::schema::Row;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Page size requested from the source
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Cover,
    Schedule,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Cover => "cover",
            PageKind::Schedule => "schedule",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded page of source records
#[derive(Debug, Clone)]
pub struct Page {
    pub kind: PageKind,
    pub index: u32,
    /// Request URL, kept for log context
    pub url: Option<String>,
    body: Value,
}

impl Page {
    pub fn new(kind: PageKind, index: u32, body: Value) -> Self {
        Self {
            kind,
            index,
            url: None,
            body,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    fn malformed(&self, detail: impl Into<String>) -> SyncError {
        SyncError::MalformedPage {
            kind: self.kind,
            page: self.index,
            detail: detail.into(),
        }
    }

    fn count_field(&self, field: &str) -> Result<u64> {
        self.body
            .get(field)
            .and_then(Value::as_u64)
            .ok_or_else(|| self.malformed(format!("'{}' missing or not a count", field)))
    }

    /// `totalMatchingCount`: items across all pages
    pub fn total_matching_count(&self) -> Result<u64> {
        self.count_field("totalMatchingCount")
    }

    /// `totalMatchingPages`: number of pages at the requested page size
    pub fn total_matching_pages(&self) -> Result<u32> {
        let pages = self.count_field("totalMatchingPages")?;
        u32::try_from(pages).map_err(|_| self.malformed(format!("{} pages is out of range", pages)))
    }

    /// Remove and return the records stored under `key`.
    pub fn take_records(&mut self, key: &str) -> Result<Vec<Row>> {
        let records = match self.body.get_mut(key).map(Value::take) {
            Some(Value::Array(records)) => records,
            Some(other) => {
                return Err(self.malformed(format!("'{}' should be a list, got {}", key, other)))
            },
            None => return Err(self.malformed(format!("'{}' is missing", key))),
        };

        records
            .into_iter()
            .map(|record| match record {
                Value::Object(row) => Ok(row),
                other => {
                    Err(self.malformed(format!("'{}' entry is not an object: {}", key, other)))
                },
            })
            .collect()
    }
}

#[async_trait]
pub trait SourceApi: Send + Sync {
    /// Establish the session used by every later page request.
    async fn authenticate(&self) -> Result<()>;

    /// Fetch page `page_index` (1-based) of `kind` records.
    async fn fetch_page(&self, kind: PageKind, page_index: u32) -> Result<Page>;
}
