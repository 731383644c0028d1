//! Fetching the entry arrays of public lists.

use std::time::Duration;

use async_trait::async_trait;

use crate::entry::ListEntry;
use crate::error::{RadarError, Result};

/// Source of public list contents.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    /// Fetch the complete entry set published at `url`.
    async fn fetch_entries(&self, url: &str) -> Result<Vec<ListEntry>>;
}

/// Fetches a bare JSON array of entries over HTTP(S).
pub struct HttpListFetcher {
    client: reqwest::Client,
}

impl HttpListFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ListFetcher for HttpListFetcher {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<ListEntry>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RadarError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json::<Vec<ListEntry>>().await?)
    }
}
