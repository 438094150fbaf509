use std::future::Future;

use crate::api::{ApiError, Article, ArticleListResponse, User};

/// Lifecycle of one view's data.
///
/// `Idle → Loading → (Ready | Empty | Failed)`, and back to `Loading` on
/// retry or parameter change.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    /// The request succeeded but matched nothing.
    Empty,
    Failed(ApiError),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ViewState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// A fetched value that may represent "no results".
pub trait Payload {
    fn has_no_results(&self) -> bool;
}

impl Payload for ArticleListResponse {
    fn has_no_results(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Payload for Vec<T> {
    fn has_no_results(&self) -> bool {
        self.is_empty()
    }
}

impl Payload for Article {
    fn has_no_results(&self) -> bool {
        false
    }
}

impl Payload for User {
    fn has_no_results(&self) -> bool {
        false
    }
}

/// Permission to run exactly one request. Its result must be handed back to
/// [`ViewController::resolve`] together with `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<P> {
    pub generation: u64,
    pub params: P,
}

/// Fetch/loading/error state machine for one view.
///
/// Each [`begin`](Self::begin) bumps a generation counter; a result carrying
/// an older generation is dropped by [`resolve`](Self::resolve), so the last
/// issued request always wins regardless of completion order.
#[derive(Debug)]
pub struct ViewController<P, T> {
    state: ViewState<T>,
    params: Option<P>,
    generation: u64,
}

impl<P, T> Default for ViewController<P, T> {
    fn default() -> Self {
        Self {
            state: ViewState::Idle,
            params: None,
            generation: 0,
        }
    }
}

impl<P: Clone, T: Payload> ViewController<P, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    /// Parameters of the most recently issued request.
    pub fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter `Loading` for `params`, superseding anything in flight.
    pub fn begin(&mut self, params: P) -> Ticket<P> {
        self.generation += 1;
        self.state = ViewState::Loading;
        self.params = Some(params.clone());
        Ticket {
            generation: self.generation,
            params,
        }
    }

    /// Re-issue the last request with identical parameters.
    ///
    /// `None` if nothing has been requested yet.
    pub fn retry(&mut self) -> Option<Ticket<P>> {
        let params = self.params.clone()?;
        Some(self.begin(params))
    }

    /// Apply a finished request. Returns `false` when the result belonged to a
    /// superseded generation and was discarded.
    pub fn resolve(&mut self, generation: u64, result: Result<T, ApiError>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Discarding superseded result"
            );
            return false;
        }
        self.state = match result {
            Ok(data) if data.has_no_results() => ViewState::Empty,
            Ok(data) => ViewState::Ready(data),
            Err(err) => ViewState::Failed(err),
        };
        true
    }

    /// `begin`, run `fetch`, then `resolve`.
    pub async fn load<F, Fut>(&mut self, params: P, fetch: F) -> &ViewState<T>
    where
        F: FnOnce(P) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let ticket = self.begin(params);
        let result = fetch(ticket.params).await;
        self.resolve(ticket.generation, result);
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    type Controller = ViewController<u32, Vec<u32>>;

    #[test]
    fn test_starts_idle() {
        let c = Controller::new();
        assert_eq!(c.state(), &ViewState::Idle);
        assert_eq!(c.generation(), 0);
        assert!(c.params().is_none());
    }

    #[test]
    fn test_begin_enters_loading() {
        let mut c = Controller::new();
        let ticket = c.begin(3);
        assert_eq!(ticket, Ticket { generation: 1, params: 3 });
        assert!(c.state().is_loading());
    }

    #[test]
    fn test_resolve_success_and_empty() {
        let mut c = Controller::new();
        let t = c.begin(1);
        assert!(c.resolve(t.generation, Ok(vec![1, 2])));
        assert_eq!(c.state().data(), Some(&vec![1, 2]));

        let t = c.begin(2);
        assert!(c.resolve(t.generation, Ok(vec![])));
        assert_eq!(c.state(), &ViewState::Empty);
    }

    #[test]
    fn test_resolve_failure_keeps_no_data() {
        let mut c = Controller::new();
        let t = c.begin(1);
        c.resolve(t.generation, Ok(vec![9]));

        let t = c.begin(1);
        c.resolve(t.generation, Err(ApiError::Transport("down".into())));
        assert!(c.state().data().is_none());
        assert_eq!(c.state().error(), Some(&ApiError::Transport("down".into())));
    }

    #[test]
    fn test_superseded_result_is_discarded() {
        let mut c = Controller::new();
        let first = c.begin(1);
        let second = c.begin(2);

        // Second finishes first, then the stale first response arrives.
        assert!(c.resolve(second.generation, Ok(vec![2])));
        assert!(!c.resolve(first.generation, Ok(vec![1])));
        assert_eq!(c.state().data(), Some(&vec![2]));
    }

    #[test]
    fn test_retry_reuses_params() {
        let mut c = Controller::new();
        assert!(c.retry().is_none());

        let t = c.begin(7);
        c.resolve(t.generation, Err(ApiError::Transport("x".into())));

        let again = c.retry().unwrap();
        assert_eq!(again.params, 7);
        assert_eq!(again.generation, 2);
        assert!(c.state().is_loading());
    }

    #[tokio::test]
    async fn test_load_runs_fetch_with_params() {
        let mut c = Controller::new();
        let state = c.load(4, |n| async move { Ok(vec![n; 2]) }).await;
        assert_eq!(state, &ViewState::Ready(vec![4, 4]));
    }
}
