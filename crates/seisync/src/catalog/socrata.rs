//! Socrata SODA client
//!
//! `PUT /resource/{id}.json` replaces a dataset, `POST` upserts into it. Both
//! take a JSON array of rows and return the row-count summary.

use super::{Catalog, WriteMode, WriteResult};
use crate::config::SocrataConfig;
use crate::error::{Result, SyncError};
use crate::schema::Row;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

const APP_TOKEN_HEADER: &str = "X-App-Token";

pub struct SocrataClient {
    client: Client,
    config: SocrataConfig,
}

impl SocrataClient {
    pub fn new(config: SocrataConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("seisync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn resource_url(&self, dataset: &str) -> String {
        format!(
            "{}/resource/{}.json",
            self.config.base_url.trim_end_matches('/'),
            dataset
        )
    }
}

#[async_trait]
impl Catalog for SocrataClient {
    async fn write(&self, dataset: &str, rows: &[Row], mode: WriteMode) -> Result<WriteResult> {
        let url = self.resource_url(dataset);
        let method = match mode {
            WriteMode::Replace => Method::PUT,
            WriteMode::Upsert => Method::POST,
        };
        debug!(dataset, %mode, rows = rows.len(), "Sending to catalog");

        let response = self
            .client
            .request(method, &url)
            .basic_auth(
                &self.config.credentials.username,
                Some(&self.config.credentials.password),
            )
            .header(APP_TOKEN_HEADER, &self.config.app_token)
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Catalog {
                dataset: dataset.to_string(),
                detail: format!("{} returned {}: {}", url, status, body),
            });
        }

        let result: WriteResult = response.json().await?;
        debug!(dataset, ?result, "Response from catalog");
        Ok(result)
    }
}
