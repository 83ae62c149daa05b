//! NetFile Connect2 client
//!
//! Authentication sets a session cookie on the underlying `reqwest` client;
//! every export request afterwards rides on that cookie.

use super::{Page, PageKind, SourceApi};
use crate::config::{NetfileConfig, Variant};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const AUTH_PATH: &str = "/Connect2/api/authenticate";
const COVER_EXPORT_PATH: &str = "/Connect2/api/public/sei/export/cover";
const SCHEDULE_EXPORT_PATH: &str = "/Connect2/api/public/sei/export/schedule";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";

pub struct NetfileClient {
    client: Client,
    config: NetfileConfig,
    redacted: bool,
}

impl NetfileClient {
    pub fn new(config: NetfileConfig, variant: Variant, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("seisync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            redacted: variant.is_redacted(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub fn page_url(&self, kind: PageKind) -> String {
        match kind {
            PageKind::Cover => self.url(COVER_EXPORT_PATH),
            PageKind::Schedule => self.url(SCHEDULE_EXPORT_PATH),
        }
    }

    fn page_params(&self, page_index: u32) -> [(&'static str, String); 4] {
        [
            ("AgencyPrefix", self.config.agency_prefix.clone()),
            ("IsRedacted", self.redacted.to_string()),
            ("PageSize", self.config.page_size.to_string()),
            ("CurrentPageIndex", page_index.to_string()),
        ]
    }
}

#[async_trait]
impl SourceApi for NetfileClient {
    async fn authenticate(&self) -> Result<()> {
        let url = self.url(AUTH_PATH);
        info!("Making authentication request");

        let form = [
            ("UserName", self.config.credentials.username.as_str()),
            ("Password", self.config.credentials.password.as_str()),
        ];
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, JSON_ACCEPT)
            .form(&form)
            .send()
            .await
            .map_err(|e| SyncError::Authentication(e.to_string()))?;

        let status = response.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED
        ) {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Authentication(format!(
                "status {}. Error Message: {}",
                status, body
            )));
        }

        debug!(%status, "Authenticated against source");
        Ok(())
    }

    async fn fetch_page(&self, kind: PageKind, page_index: u32) -> Result<Page> {
        let url = self.page_url(kind);
        let params = self.page_params(page_index);
        debug!(
            kind = %kind,
            page = page_index,
            redacted = self.redacted,
            "Requesting {} data",
            kind
        );

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, JSON_ACCEPT)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .query(&params)
            .send()
            .await
            .map_err(|e| SyncError::Extraction {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let request_url = response.url().to_string();
        let status = response.status();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Extraction {
                url: request_url,
                reason: format!("Response code: {}. Error Message: {}", status, body),
            });
        }

        let body: Value = response.json().await.map_err(|e| SyncError::MalformedPage {
            kind,
            page: page_index,
            detail: e.to_string(),
        })?;

        Ok(Page::new(kind, page_index, body).with_url(request_url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn config() -> NetfileConfig {
        NetfileConfig {
            base_url: "https://netfile.example/".to_string(),
            credentials: Credentials::new("login", "secret"),
            agency_prefix: "SFO".to_string(),
            page_size: 1000,
        }
    }

    #[test]
    fn test_page_urls() {
        let client =
            NetfileClient::new(config(), Variant::Redacted, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.page_url(PageKind::Cover),
            "https://netfile.example/Connect2/api/public/sei/export/cover"
        );
        assert_eq!(
            client.page_url(PageKind::Schedule),
            "https://netfile.example/Connect2/api/public/sei/export/schedule"
        );
    }

    #[test]
    fn test_page_params_follow_variant() {
        let redacted =
            NetfileClient::new(config(), Variant::Redacted, Duration::from_secs(5)).unwrap();
        let params = redacted.page_params(3);
        assert_eq!(params[0], ("AgencyPrefix", "SFO".to_string()));
        assert_eq!(params[1], ("IsRedacted", "true".to_string()));
        assert_eq!(params[2], ("PageSize", "1000".to_string()));
        assert_eq!(params[3], ("CurrentPageIndex", "3".to_string()));

        let unredacted =
            NetfileClient::new(config(), Variant::Unredacted, Duration::from_secs(5)).unwrap();
        assert_eq!(unredacted.page_params(1)[1], ("IsRedacted", "false".to_string()));
    }
}
