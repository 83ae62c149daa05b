//! SEI Sync Common Library
//!
//! Shared plumbing for the SEI sync workspace:
//!
//! - **Errors**: [`CommonError`] and its [`Result`] alias
//! - **Environment**: typed lookups of environment variables
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use seisync_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> seisync_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod env;
pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
