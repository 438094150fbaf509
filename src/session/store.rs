use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use super::filters::{FilterPatch, Filters};
use crate::api::User;
use crate::storage::StateStorage;

/// Name of the single persisted entry.
pub const STORAGE_KEY: &str = "ai-news-storage";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend rejected a read or write
    #[error("Failed to persist client state: {0:#}")]
    Persist(anyhow::Error),

    #[error("Failed to encode client state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A profile was supplied while no credential is held
    #[error("Cannot cache a user profile without a session token")]
    NoSession,
}

// ============================================================================
// Persisted Shape
// ============================================================================

/// On-disk form: `{ "token": ..., "filters": {...} }`. The cached user is
/// never written.
#[derive(Serialize, Deserialize, Default)]
struct PersistedState {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    filters: Filters,
}

struct Inner {
    token: Option<SecretString>,
    user: Option<User>,
    filters: Filters,
}

// ============================================================================
// SessionStore
// ============================================================================

/// Process-wide session and preference state.
///
/// Holds the bearer token, the cached profile of its owner and the listing
/// filters. Every mutation persists `{token, filters}` through the injected
/// [`StateStorage`]. Share it as `Arc<SessionStore>`.
///
/// The in-memory lock is never held across an `.await`: mutations replace or
/// merge under the lock, then persist a snapshot taken afterwards. A separate
/// async mutex orders those writes so the stored entry always reflects the
/// latest state.
pub struct SessionStore {
    inner: RwLock<Inner>,
    storage: Arc<dyn StateStorage>,
    filters_tx: watch::Sender<Filters>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl SessionStore {
    /// A signed-out store with default filters. Nothing is read from storage.
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self::from_parts(storage, None, Filters::default())
    }

    /// Rehydrate from the persisted entry.
    ///
    /// A missing entry yields defaults. A corrupt entry is logged and replaced
    /// by defaults rather than failing startup. Storage read errors propagate.
    pub async fn hydrate(storage: Arc<dyn StateStorage>) -> Result<Self, StoreError> {
        let raw = storage.load(STORAGE_KEY).await.map_err(StoreError::Persist)?;

        let persisted = match raw {
            None => PersistedState::default(),
            Some(json) => match serde_json::from_str::<PersistedState>(&json) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, key = STORAGE_KEY, "Discarding corrupt persisted state");
                    PersistedState::default()
                }
            },
        };

        let token = persisted
            .token
            .filter(|t| !t.is_empty())
            .map(SecretString::from);
        tracing::debug!(
            authenticated = token.is_some(),
            filters_active = persisted.filters.is_active(),
            "Session state restored"
        );

        Ok(Self::from_parts(storage, token, persisted.filters))
    }

    fn from_parts(
        storage: Arc<dyn StateStorage>,
        token: Option<SecretString>,
        filters: Filters,
    ) -> Self {
        let (filters_tx, _) = watch::channel(filters.clone());
        Self {
            inner: RwLock::new(Inner {
                token,
                user: None,
                filters,
            }),
            storage,
            filters_tx,
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .read()
            .token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().token.is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn filters(&self) -> Filters {
        self.inner.read().filters.clone()
    }

    /// Receiver that observes every effective filter change.
    pub fn subscribe_filters(&self) -> watch::Receiver<Filters> {
        self.filters_tx.subscribe()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Replace the credential. `None` signs out locally and also drops the
    /// cached user so the profile never outlives its token.
    pub async fn set_token(&self, token: Option<String>) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.write();
            match token.filter(|t| !t.is_empty()) {
                Some(t) => inner.token = Some(SecretString::from(t)),
                None => {
                    inner.token = None;
                    inner.user = None;
                }
            }
        }
        self.persist().await
    }

    /// Replace the cached profile. In-memory only.
    pub fn set_user(&self, user: Option<User>) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if user.is_some() && inner.token.is_none() {
            return Err(StoreError::NoSession);
        }
        inner.user = user;
        Ok(())
    }

    /// Shallow-merge `patch` into the filters, persist, and notify subscribers.
    ///
    /// Returns the merged filter set.
    pub async fn set_filters(&self, patch: FilterPatch) -> Result<Filters, StoreError> {
        let merged = {
            let mut inner = self.inner.write();
            inner.filters = inner.filters.merge(&patch);
            inner.filters.clone()
        };
        self.publish_filters(&merged);
        self.persist().await?;
        Ok(merged)
    }

    /// Reset the filters to their defaults.
    pub async fn clear_filters(&self) -> Result<(), StoreError> {
        {
            self.inner.write().filters = Filters::default();
        }
        self.publish_filters(&Filters::default());
        self.persist().await
    }

    /// Drop token and user together. Filters are kept.
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.clear_credentials();
        tracing::debug!("Signed out");
        self.persist().await
    }

    /// Called by the API client when the backend answers `401` to a request
    /// sent with `rejected`. A credential replaced since then is kept.
    pub async fn invalidate_credentials(
        &self,
        rejected: Option<&SecretString>,
    ) -> Result<(), StoreError> {
        {
            let inner = self.inner.read();
            let held = inner.token.as_ref().map(|t| t.expose_secret());
            if held != rejected.map(|t| t.expose_secret()) {
                tracing::debug!("Credential changed while the request was in flight, keeping it");
                return Ok(());
            }
        }
        if !self.clear_credentials() {
            return Ok(());
        }
        self.persist().await
    }

    /// Returns whether anything was held.
    fn clear_credentials(&self) -> bool {
        let mut inner = self.inner.write();
        let had = inner.token.is_some() || inner.user.is_some();
        inner.token = None;
        inner.user = None;
        had
    }

    fn publish_filters(&self, filters: &Filters) {
        self.filters_tx.send_if_modified(|current| {
            if current == filters {
                return false;
            }
            *current = filters.clone();
            true
        });
    }

    /// Write `{token, filters}`. A signed-out state with default filters is
    /// what a missing entry hydrates to, so the entry is removed instead.
    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;

        let json = {
            let inner = self.inner.read();
            if inner.token.is_none() && inner.filters == Filters::default() {
                None
            } else {
                let snapshot = PersistedState {
                    token: inner.token.as_ref().map(|t| t.expose_secret().to_string()),
                    filters: inner.filters.clone(),
                };
                Some(serde_json::to_string(&snapshot)?)
            }
        };

        let result = match json {
            Some(json) => self.storage.save(STORAGE_KEY, &json).await,
            None => self.storage.remove(STORAGE_KEY).await,
        };
        result.map_err(StoreError::Persist)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SessionStore")
            .field("token", &inner.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &inner.user.as_ref().map(|u| u.id))
            .field("filters", &inner.filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn user(id: i64) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "email": "reader@example.com",
        }))
        .unwrap()
    }

    fn memory() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    fn persisted(storage: &MemoryStorage) -> serde_json::Value {
        let raw = storage.snapshot(STORAGE_KEY).expect("entry written");
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_hydrate_empty_storage_yields_defaults() {
        let store = SessionStore::hydrate(memory()).await.unwrap();
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert_eq!(store.filters(), Filters::default());
    }

    #[tokio::test]
    async fn test_hydrate_corrupt_entry_yields_defaults() {
        let storage = memory();
        storage.save(STORAGE_KEY, "{not json").await.unwrap();

        let store = SessionStore::hydrate(storage).await.unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.filters(), Filters::default());
    }

    #[tokio::test]
    async fn test_hydrate_restores_token_and_filters() {
        let storage = memory();
        storage
            .save(
                STORAGE_KEY,
                r#"{"token":"abc","filters":{"category":"llm","source":"","min_score":70,"search":""}}"#,
            )
            .await
            .unwrap();

        let store = SessionStore::hydrate(storage).await.unwrap();
        assert_eq!(store.token().unwrap().expose_secret(), "abc");
        assert_eq!(store.filters().category, "llm");
        assert_eq!(store.filters().min_score, 70);
    }

    #[tokio::test]
    async fn test_set_token_persists_only_token_and_filters() {
        let storage = memory();
        let store = SessionStore::new(storage.clone());

        store.set_token(Some("tok".into())).await.unwrap();
        store.set_user(Some(user(1))).unwrap();
        store.set_filters(FilterPatch::source("arxiv")).await.unwrap();

        let value = persisted(&storage);
        assert_eq!(value["token"], "tok");
        assert_eq!(value["filters"]["source"], "arxiv");
        assert!(value.get("user").is_none());
    }

    #[tokio::test]
    async fn test_set_user_without_token_is_rejected() {
        let store = SessionStore::new(memory());
        let err = store.set_user(Some(user(1))).unwrap_err();
        assert!(matches!(err, StoreError::NoSession));
        // Clearing is always allowed.
        store.set_user(None).unwrap();
    }

    #[tokio::test]
    async fn test_set_token_none_drops_user() {
        let store = SessionStore::new(memory());
        store.set_token(Some("tok".into())).await.unwrap();
        store.set_user(Some(user(7))).unwrap();

        store.set_token(None).await.unwrap();
        assert!(store.token().is_none());
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn test_set_filters_merges() {
        let store = SessionStore::new(memory());
        store
            .set_filters(FilterPatch {
                category: Some("llm".into()),
                min_score: Some(60),
                ..FilterPatch::default()
            })
            .await
            .unwrap();

        let merged = store.set_filters(FilterPatch::source("arxiv")).await.unwrap();
        assert_eq!(
            merged,
            Filters {
                category: "llm".into(),
                source: "arxiv".into(),
                min_score: 60,
                search: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_logout_keeps_filters() {
        let storage = memory();
        let store = SessionStore::new(storage.clone());
        store.set_token(Some("tok".into())).await.unwrap();
        store.set_user(Some(user(1))).unwrap();
        store.set_filters(FilterPatch::category("cv")).await.unwrap();

        store.logout().await.unwrap();

        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert_eq!(store.filters().category, "cv");
        let value = persisted(&storage);
        assert!(value["token"].is_null());
        assert_eq!(value["filters"]["category"], "cv");
    }

    #[tokio::test]
    async fn test_invalidate_credentials_clears_token_and_user() {
        let storage = memory();
        let store = SessionStore::new(storage.clone());
        store.set_token(Some("tok".into())).await.unwrap();
        store.set_user(Some(user(3))).unwrap();

        let rejected = store.token();
        store.invalidate_credentials(rejected.as_ref()).await.unwrap();

        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        // Nothing left worth keeping.
        assert_eq!(storage.snapshot(STORAGE_KEY), None);
    }

    #[tokio::test]
    async fn test_late_rejection_keeps_newer_credential() {
        let storage = memory();
        let store = SessionStore::new(storage.clone());
        store.set_token(Some("old".into())).await.unwrap();
        let rejected = store.token();

        // A new sign-in lands before the 401 for the old token comes back.
        store.set_token(Some("new".into())).await.unwrap();
        store.set_user(Some(user(4))).unwrap();
        store.invalidate_credentials(rejected.as_ref()).await.unwrap();

        assert_eq!(store.token().unwrap().expose_secret(), "new");
        assert_eq!(store.user().unwrap().id, 4);
        assert_eq!(persisted(&storage)["token"], "new");

        // An anonymous request's 401 does not sign anyone out either.
        store.invalidate_credentials(None).await.unwrap();
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_default_state_removes_entry() {
        let storage = memory();
        let store = SessionStore::new(storage.clone());
        store.set_filters(FilterPatch::min_score(40)).await.unwrap();
        assert_eq!(persisted(&storage)["filters"]["min_score"], 40);

        store.clear_filters().await.unwrap();
        assert_eq!(storage.snapshot(STORAGE_KEY), None);

        store.set_token(Some("tok".into())).await.unwrap();
        assert_eq!(persisted(&storage)["token"], "tok");
        store.logout().await.unwrap();
        assert_eq!(storage.snapshot(STORAGE_KEY), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_but_not_noops() {
        let store = SessionStore::new(memory());
        let mut rx = store.subscribe_filters();

        store.set_filters(FilterPatch::category("agent")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().category, "agent");

        store.set_filters(FilterPatch::category("agent")).await.unwrap();
        assert!(!rx.has_changed().unwrap());

        store.clear_filters().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Filters::default());
    }

    #[tokio::test]
    async fn test_debug_redacts_token() {
        let store = SessionStore::new(memory());
        store.set_token(Some("super-secret".into())).await.unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    fn filters_strategy() -> impl Strategy<Value = Filters> {
        (
            "[a-z_]{0,12}",
            "[a-z_]{0,12}",
            (0u32..=9).prop_map(|s| s * 10),
            "\\PC{0,24}",
        )
            .prop_map(|(category, source, min_score, search)| Filters {
                category,
                source,
                min_score,
                search,
            })
    }

    proptest! {
        #[test]
        fn prop_filters_survive_persist_and_hydrate(filters in filters_strategy()) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let storage = memory();
                let store = SessionStore::new(storage.clone());
                store
                    .set_filters(FilterPatch {
                        category: Some(filters.category.clone()),
                        source: Some(filters.source.clone()),
                        min_score: Some(filters.min_score),
                        search: Some(filters.search.clone()),
                    })
                    .await
                    .unwrap();

                let restored = SessionStore::hydrate(storage).await.unwrap();
                assert_eq!(restored.filters(), filters);
            });
        }
    }
}
