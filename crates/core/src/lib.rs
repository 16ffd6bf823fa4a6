//! ComAI Core Library
//!
//! This crate provides the foundational utilities shared by every ComAI crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management, including the casual-phrase table

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, CasualPhrase};
pub use error::{AppError, AppResult};
