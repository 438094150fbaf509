use thiserror::Error;

use super::controller::{Ticket, ViewController, ViewState};
use super::pagination::Pagination;
use crate::api::{ApiClient, ApiError, ArticleListResponse, ArticleQuery};
use crate::session::Filters;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page {requested} is out of range (1-{total_pages})")]
    OutOfRange { requested: u32, total_pages: u32 },

    #[error("No listing has been loaded yet")]
    NothingLoaded,
}

/// Paged, filtered article listing.
///
/// A filter change always restarts at page 1. Page navigation reuses the
/// last query and only offers pages the backend reported.
#[derive(Debug)]
pub struct ArticlesPage {
    controller: ViewController<ArticleQuery, ArticleListResponse>,
    page_size: u32,
    pagination: Option<Pagination>,
}

impl ArticlesPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            controller: ViewController::new(),
            page_size: page_size.max(1),
            pagination: None,
        }
    }

    pub fn state(&self) -> &ViewState<ArticleListResponse> {
        self.controller.state()
    }

    /// Position from the last successful response. Survives a failed page
    /// request so the pager can still be drawn.
    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    pub fn query(&self) -> Option<&ArticleQuery> {
        self.controller.params()
    }

    /// Start over at page 1 with `filters`.
    pub fn begin_filtered(&mut self, filters: &Filters) -> Ticket<ArticleQuery> {
        self.pagination = None;
        self.controller
            .begin(ArticleQuery::from_filters(filters, 1, self.page_size))
    }

    /// Request `page` of the current query.
    pub fn go_to(&mut self, page: u32) -> Result<Ticket<ArticleQuery>, PageError> {
        let pagination = self.pagination.ok_or(PageError::NothingLoaded)?;
        if !pagination.contains(page) {
            return Err(PageError::OutOfRange {
                requested: page,
                total_pages: pagination.total_pages(),
            });
        }
        let query = self
            .controller
            .params()
            .ok_or(PageError::NothingLoaded)?
            .with_page(page);
        Ok(self.controller.begin(query))
    }

    pub fn next_page(&mut self) -> Result<Ticket<ArticleQuery>, PageError> {
        let current = self.pagination.ok_or(PageError::NothingLoaded)?;
        self.go_to(current.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Result<Ticket<ArticleQuery>, PageError> {
        let current = self.pagination.ok_or(PageError::NothingLoaded)?;
        self.go_to(current.page.saturating_sub(1))
    }

    pub fn retry(&mut self) -> Option<Ticket<ArticleQuery>> {
        self.controller.retry()
    }

    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<ArticleListResponse, ApiError>,
    ) -> bool {
        let position = result.as_ref().ok().map(|resp| Pagination {
            page: resp.page,
            page_size: if resp.page_size == 0 {
                self.page_size
            } else {
                resp.page_size
            },
            total: resp.total,
        });
        let applied = self.controller.resolve(generation, result);
        if applied {
            if let Some(position) = position {
                self.pagination = Some(position);
            }
        }
        applied
    }

    /// Fetch for a ticket. Kept separate from `resolve` so the call can run on
    /// a spawned task.
    pub async fn fetch(
        client: &ApiClient,
        ticket: &Ticket<ArticleQuery>,
    ) -> Result<ArticleListResponse, ApiError> {
        client.articles().list(&ticket.params).await
    }

    /// Load page 1 for `filters` in place.
    pub async fn load(
        &mut self,
        client: &ApiClient,
        filters: &Filters,
    ) -> &ViewState<ArticleListResponse> {
        let ticket = self.begin_filtered(filters);
        let result = Self::fetch(client, &ticket).await;
        self.resolve(ticket.generation, result);
        self.state()
    }

    /// Load `page` of the current query in place.
    pub async fn load_page(
        &mut self,
        client: &ApiClient,
        page: u32,
    ) -> Result<&ViewState<ArticleListResponse>, PageError> {
        let ticket = self.go_to(page)?;
        let result = Self::fetch(client, &ticket).await;
        self.resolve(ticket.generation, result);
        Ok(self.state())
    }
}
