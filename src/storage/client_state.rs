use anyhow::Result;
use async_trait::async_trait;

use super::schema::Database;
use super::types::StateStorage;

impl Database {
    // ========================================================================
    // Client State Operations
    // ========================================================================

    /// Get a single state entry by key.
    pub async fn get_state(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM client_state WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a state entry (UPSERT), refreshing its timestamp.
    pub async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_state (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a state entry. Returns whether a row was removed.
    pub async fn delete_state(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StateStorage for Database {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        self.get_state(key).await
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.set_state(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.delete_state(key).await.map(|_| ())
    }
}
