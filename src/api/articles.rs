use reqwest::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::models::{Article, ArticleListResponse, ArticleQuery, FilterOption};

/// `/articles` operations.
pub struct Articles<'a> {
    client: &'a ApiClient,
}

impl<'a> Articles<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// One page of the filtered listing.
    pub async fn list(&self, query: &ArticleQuery) -> Result<ArticleListResponse, ApiError> {
        let req = self
            .client
            .request(Method::GET, "/articles", &query.to_pairs())?;
        self.client.send_json(req).await
    }

    /// Today's top picks, ordered by quality score.
    pub async fn today(&self, limit: u32, min_score: u32) -> Result<Vec<Article>, ApiError> {
        let params = [
            ("limit", limit.to_string()),
            ("min_score", min_score.to_string()),
        ];
        let req = self
            .client
            .request(Method::GET, "/articles/today", &params)?;
        self.client.send_json(req).await
    }

    /// A single article, or `ApiError::NotFound`.
    pub async fn get(&self, id: i64) -> Result<Article, ApiError> {
        let req = self
            .client
            .request(Method::GET, &format!("/articles/{id}"), &[])?;
        self.client.send_json(req).await
    }

    pub async fn categories(&self) -> Result<Vec<FilterOption>, ApiError> {
        let req = self
            .client
            .request(Method::GET, "/articles/categories", &[])?;
        self.client.send_json(req).await
    }

    pub async fn sources(&self) -> Result<Vec<FilterOption>, ApiError> {
        let req = self
            .client
            .request(Method::GET, "/articles/sources", &[])?;
        self.client.send_json(req).await
    }

    /// Categories and sources fetched concurrently, for the filter picker.
    pub async fn filter_options(
        &self,
    ) -> Result<(Vec<FilterOption>, Vec<FilterOption>), ApiError> {
        futures::future::try_join(self.categories(), self.sources()).await
    }
}
