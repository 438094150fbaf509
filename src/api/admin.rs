use reqwest::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::models::{AdminStats, CrawlAck, ProcessAck};

/// `/admin` operations. Privilege is checked by the backend only.
pub struct Admin<'a> {
    client: &'a ApiClient,
}

impl<'a> Admin<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Run every crawler now. Blocks until the backend finishes the crawl.
    pub async fn crawl(&self) -> Result<CrawlAck, ApiError> {
        let req = self.client.request(Method::POST, "/admin/crawl", &[])?;
        self.client.send_json(req).await
    }

    /// Score and summarize up to `limit` pending articles.
    pub async fn process(&self, limit: u32) -> Result<ProcessAck, ApiError> {
        let req = self.client.request(
            Method::POST,
            "/admin/process",
            &[("limit", limit.to_string())],
        )?;
        self.client.send_json(req).await
    }

    pub async fn stats(&self) -> Result<AdminStats, ApiError> {
        let req = self.client.request(Method::GET, "/admin/stats", &[])?;
        self.client.send_json(req).await
    }
}
