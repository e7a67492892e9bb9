//! # SQLite record store
//!
//! Persistent [`RecordStore`]: one row per user, the history stored as a JSON array of turns.
//!
//! ```sql
//! CREATE TABLE conversations (
//!     user_id TEXT PRIMARY KEY,
//!     messages TEXT NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::Utc;
use memory_core::{ChatMessage, ConversationRecord, MemoryError, RecordStore};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use tracing::info;

fn db_error(e: sqlx::Error) -> MemoryError {
    MemoryError::Database(e.to_string())
}

/// SQLite-backed record store. The pool is opened once and shared by all users.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Opens (creating if missing) the database file at `path` and ensures the schema.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        info!(path = %path, "Initializing SQLite record store");

        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(path);
        let pool = SqlitePool::connect_with(options).await.map_err(db_error)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                user_id TEXT PRIMARY KEY,
                messages TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, user_id: &str) -> Result<Option<ConversationRecord>, MemoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT messages FROM conversations WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(|(json,)| {
            let messages: Vec<ChatMessage> = serde_json::from_str(&json)
                .map_err(|e| MemoryError::Serialization(e.to_string()))?;
            Ok(ConversationRecord {
                user_id: user_id.to_string(),
                messages,
            })
        })
        .transpose()
    }

    async fn upsert(&self, record: &ConversationRecord) -> Result<(), MemoryError> {
        let json = serde_json::to_string(&record.messages)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO conversations (user_id, messages, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                messages = excluded.messages,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.user_id)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
