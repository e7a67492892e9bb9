//! # plugin-orchestrator
//!
//! Answers a user query, optionally through a plugin:
//!
//! ```text
//! Selecting ──► Executing ──► Synthesizing ──► Done
//!     │             │              
//!     └─────────────┴──► Failed
//! ```
//!
//! - **Selecting**: resolve the plugin, stream the model's `{path, query}` choice.
//! - **Executing**: `GET {api_host}{path}?query=…`, decode JSON.
//! - **Synthesizing**: stream the final answer from the fetched data.
//! - **Done**: persist user turn, stage-1 text and answer in one append.
//!
//! Failures after stage 1 still persist the user turn and the stage-1 text.

mod action;
mod channel;
mod error;
mod executor;
mod orchestrator;

pub use action::{ActionDescriptor, ActionParseError};
pub use channel::ReplyChannel;
pub use error::PipelineError;
pub use executor::{json_excerpt, ActionExecutor, ExecutionError};
pub use orchestrator::{
    PipelineStage, QueryRequest, ToolOrchestrator, PLACEHOLDER, RESULT_EXCERPT_CHARS,
    RESULT_PREVIEW_CHARS,
};
