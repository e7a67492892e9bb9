//! [`ConversationMemory`]: the store every orchestration shares.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use prompt::ChatMessage;
use tracing::{debug, info, instrument};

use crate::budget::{evict_oldest, newest_within, total_content_len};
use crate::{ConversationRecord, MemoryError, RecordStore};

/// Character budget per user when none is configured.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1500;

type UserLock = Arc<tokio::sync::Mutex<()>>;

/// Per-user bounded history over a [`RecordStore`].
///
/// Appends and clears for the same user run one at a time; different users never wait on
/// each other.
pub struct ConversationMemory {
    store: Arc<dyn RecordStore>,
    max_content_length: usize,
    user_locks: Mutex<HashMap<String, UserLock>>,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn RecordStore>, max_content_length: usize) -> Self {
        Self {
            store,
            max_content_length,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_budget(store: Arc<dyn RecordStore>) -> Self {
        Self::new(store, DEFAULT_MAX_CONTENT_LENGTH)
    }

    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    fn lock_for(&self, user_id: &str) -> UserLock {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    /// Drops the user's lock entry once no other caller holds or waits on it.
    fn release(&self, user_id: &str, lock: UserLock) {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
    }

    /// Appends `turns` in order, then evicts the oldest turns until the budget holds.
    /// A user without history gets a new record.
    #[instrument(skip(self, turns), fields(turn_count = turns.len()))]
    pub async fn append(&self, user_id: &str, turns: Vec<ChatMessage>) -> Result<(), MemoryError> {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.append_locked(user_id, turns).await
        };
        self.release(user_id, lock);
        result
    }

    async fn append_locked(
        &self,
        user_id: &str,
        turns: Vec<ChatMessage>,
    ) -> Result<(), MemoryError> {
        let mut record = self
            .store
            .get(user_id)
            .await?
            .unwrap_or_else(|| ConversationRecord::empty(user_id));
        record.messages.extend(turns);
        let evicted = evict_oldest(&mut record.messages, self.max_content_length);
        self.store.upsert(&record).await?;

        info!(
            user_id = %user_id,
            retained = record.messages.len(),
            evicted,
            total_len = total_content_len(&record.messages),
            "Conversation memory updated"
        );
        Ok(())
    }

    /// Newest turns fitting in `max_content_length`, oldest-first. Does not modify the store.
    pub async fn read(
        &self,
        user_id: &str,
        max_content_length: usize,
    ) -> Result<Vec<ChatMessage>, MemoryError> {
        let messages = match self.store.get(user_id).await? {
            Some(record) => newest_within(&record.messages, max_content_length),
            None => Vec::new(),
        };
        debug!(user_id = %user_id, count = messages.len(), "Conversation memory read");
        Ok(messages)
    }

    /// [`ConversationMemory::read`] with the configured budget.
    pub async fn recent(&self, user_id: &str) -> Result<Vec<ChatMessage>, MemoryError> {
        self.read(user_id, self.max_content_length).await
    }

    /// Resets the user's history to empty. No-op for an unknown user.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: &str) -> Result<(), MemoryError> {
        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.clear_locked(user_id).await
        };
        self.release(user_id, lock);
        result
    }

    async fn clear_locked(&self, user_id: &str) -> Result<(), MemoryError> {
        if self.store.get(user_id).await?.is_some() {
            self.store.upsert(&ConversationRecord::empty(user_id)).await?;
            info!(user_id = %user_id, "Conversation memory cleared");
        }
        Ok(())
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
