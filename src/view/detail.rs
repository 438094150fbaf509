use super::controller::{Ticket, ViewController, ViewState};
use crate::api::{ApiClient, ApiError, Article};

/// A single article by id.
#[derive(Debug, Default)]
pub struct ArticleDetailPage {
    controller: ViewController<i64, Article>,
}

impl ArticleDetailPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<Article> {
        self.controller.state()
    }

    pub fn begin(&mut self, id: i64) -> Ticket<i64> {
        self.controller.begin(id)
    }

    pub fn retry(&mut self) -> Option<Ticket<i64>> {
        self.controller.retry()
    }

    pub fn resolve(&mut self, generation: u64, result: Result<Article, ApiError>) -> bool {
        self.controller.resolve(generation, result)
    }

    pub async fn load(&mut self, client: &ApiClient, id: i64) -> &ViewState<Article> {
        self.controller
            .load(id, |id| async move { client.articles().get(id).await })
            .await
    }
}
