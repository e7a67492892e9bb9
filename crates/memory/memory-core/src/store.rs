//! Persistence seam for conversation histories.

use async_trait::async_trait;
use prompt::ChatMessage;
use serde::{Deserialize, Serialize};

use crate::MemoryError;

/// One user's stored history, oldest turn first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
}

impl ConversationRecord {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            messages: Vec::new(),
        }
    }
}

/// Record store keyed by `user_id`. Implementations need not serialize concurrent
/// read-modify-write cycles; [`crate::ConversationMemory`] does that.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<ConversationRecord>, MemoryError>;
    async fn upsert(&self, record: &ConversationRecord) -> Result<(), MemoryError>;
}
