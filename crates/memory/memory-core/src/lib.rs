//! # memory-core
//!
//! Bounded conversational memory keyed by user.
//!
//! - [`ConversationRecord`] – persisted unit: `{user_id, messages}`
//! - [`RecordStore`] – get-by-key / upsert persistence seam (in-memory, SQLite, ...)
//! - [`budget`] – "keep newest, drop oldest" rules applied at write and read time
//! - [`ConversationMemory`] – append / read / clear with per-user serialization

pub mod budget;
mod error;
mod memory;
mod store;

pub use error::MemoryError;
pub use memory::{ConversationMemory, DEFAULT_MAX_CONTENT_LENGTH};
pub use prompt::{ChatMessage, MessageRole};
pub use store::{ConversationRecord, RecordStore};
