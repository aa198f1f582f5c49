//! Shared types for the gym console
//!
//! Data model, unified error types and small utilities used by the
//! console engine and any presentation layer built on top of it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
