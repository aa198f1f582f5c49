//! Data models
//!
//! Persisted documents use camelCase field names; timestamps are UTC and
//! serialized as RFC 3339, money as `Decimal`.

pub mod member;
pub mod settings;
pub mod staff;
pub mod transaction;

// Re-exports
pub use member::*;
pub use settings::*;
pub use staff::*;
pub use transaction::*;
