//! In-memory implementation of [`RecordStore`] for development and tests.

use memory_core::{ConversationRecord, MemoryError, RecordStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type RecordMap = HashMap<String, ConversationRecord>;

/// Process-local record store; contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<RecordMap>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a record.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, user_id: &str) -> Result<Option<ConversationRecord>, MemoryError> {
        let record = self.records.read().await.get(user_id).cloned();
        debug!(user_id = %user_id, found = record.is_some(), "In-memory record lookup");
        Ok(record)
    }

    async fn upsert(&self, record: &ConversationRecord) -> Result<(), MemoryError> {
        self.records
            .write()
            .await
            .insert(record.user_id.clone(), record.clone());
        debug!(
            user_id = %record.user_id,
            messages = record.messages.len(),
            "In-memory record written"
        );
        Ok(())
    }
}
