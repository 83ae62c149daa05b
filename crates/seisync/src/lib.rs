//! SEI Sync Library
//!
//! Copies Form 700 Statement of Economic Interests filings from the NetFile
//! Connect2 API into Socrata open-data datasets.
//!
//! A run authenticates, pulls every cover page, publishes the cover dataset,
//! then pulls every schedule page, joins each schedule item to its filing and
//! publishes one dataset per schedule. Row counts are reconciled after each
//! extraction and each load; any mismatch stops the run.
//!
//! # Example
//!
//! ```no_run
//! use seisync::{run_sync, SyncConfig, Variant};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncConfig::load()?;
//!     let report = run_sync(&config, Variant::Redacted).await?;
//!     println!("{} schedule rows published", report.items.created);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod catalog;
pub mod category;
pub mod config;
pub mod dates;
pub mod error;
pub mod flatten;
pub mod loader;
pub mod pipeline;
pub mod sanity;
pub mod schema;
pub mod source;
pub mod stage;
pub mod transform;

pub use catalog::{Catalog, SocrataClient, WriteMode, WriteResult};
pub use category::Category;
pub use config::{SyncConfig, Variant};
pub use error::{Result, SyncError};
pub use pipeline::{run_sync, SyncPipeline, SyncReport};
pub use schema::{Row, Schemas};
pub use source::{NetfileClient, Page, PageKind, SourceApi};
pub use stage::SyncStage;
