//! Real-time synchronization
//!
//! - [`LiveState`] - session-scoped cache of the watched collections
//! - [`spawn_status_watch`] - first-run flag observer

pub mod live;
pub mod status;

pub use live::{LiveData, LiveState};
pub use status::spawn_status_watch;
