//! # dbot-core
//!
//! Application-level pieces shared by the Telegram transport and the CLI: [`AppConfig`] loaded from
//! the environment, [`init_tracing`], and [`DbotError`].

pub mod config;
pub mod error;
pub mod logger;

pub use config::{AppConfig, MemoryStoreType};
pub use error::{DbotError, Result};
pub use logger::init_tracing;
