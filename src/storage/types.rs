use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another ainews process holds the state database
    #[error("Another instance of ainews appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a sqlx error, mapping SQLite lock conditions to `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN all surface through these messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Storage Seam
// ============================================================================

/// Durable key/value storage for client state.
///
/// The session store writes one named entry through this trait. Production
/// uses the SQLite [`Database`](super::Database); tests and `--ephemeral`
/// runs use [`MemoryStorage`](super::MemoryStorage).
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Read an entry. `Ok(None)` when the key was never written or was removed.
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Write an entry, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Delete an entry. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
