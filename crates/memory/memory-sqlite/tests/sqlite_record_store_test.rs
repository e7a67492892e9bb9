//! Integration tests for [`memory_sqlite::SqliteRecordStore`] on a temporary database file.

use memory_core::{ChatMessage, ConversationMemory, ConversationRecord, RecordStore};
use memory_sqlite::SqliteRecordStore;
use std::sync::Arc;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> SqliteRecordStore {
    let path = dir.path().join("memory.db");
    SqliteRecordStore::new(path.to_str().unwrap())
        .await
        .expect("open sqlite store")
}

/// **Test: Unknown user has no record.**
#[tokio::test]
async fn get_unknown_user_returns_none() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    assert!(store.get("404").await.unwrap().is_none());
}

/// **Test: Upsert inserts then overwrites; roles and order survive the JSON column.**
#[tokio::test]
async fn upsert_inserts_and_overwrites() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;

    let mut record = ConversationRecord::empty("7");
    record.messages = vec![ChatMessage::user("Kim: hi"), ChatMessage::assistant("hello")];
    store.upsert(&record).await.unwrap();
    assert_eq!(store.get("7").await.unwrap().unwrap(), record);

    record.messages.push(ChatMessage::assistant("again"));
    store.upsert(&record).await.unwrap();
    let stored = store.get("7").await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 3);
    assert_eq!(stored.messages[2], ChatMessage::assistant("again"));
}

/// **Test: History persists across store instances on the same file.**
///
/// **Setup:** Append through one `ConversationMemory`, reopen the file with a new store.
/// **Expected:** The reopened store returns the same turns.
#[tokio::test]
async fn history_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let memory = ConversationMemory::with_default_budget(Arc::new(open(&dir).await));
        memory
            .append("9", vec![ChatMessage::user("remember me")])
            .await
            .unwrap();
    }

    let memory = ConversationMemory::with_default_budget(Arc::new(open(&dir).await));
    assert_eq!(
        memory.recent("9").await.unwrap(),
        vec![ChatMessage::user("remember me")]
    );
}

/// **Test: Budget eviction is persisted.**
#[tokio::test]
async fn eviction_is_persisted() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open(&dir).await);
    let memory = ConversationMemory::new(store.clone(), 10);

    memory
        .append("1", vec![ChatMessage::user("aaaaaa"), ChatMessage::assistant("bbbbbb")])
        .await
        .unwrap();

    let stored = store.get("1").await.unwrap().unwrap();
    assert_eq!(stored.messages, vec![ChatMessage::assistant("bbbbbb")]);
}
