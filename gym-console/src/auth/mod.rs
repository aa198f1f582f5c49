//! 认证模块
//!
//! - [`AccessGate`] - first-run setup and login routing
//! - [`CredentialProvider`] - external authentication seam
//! - [`MemoryCredentialProvider`] - in-process provider (argon2 hashes)

pub mod gate;
pub mod memory;
pub mod provider;

pub use gate::{AccessGate, BootstrapCredential, GateState, LoginOutcome, SetupForm};
pub use memory::MemoryCredentialProvider;
pub use provider::{AuthError, AuthResult, CredentialProvider, Session, SessionEvent};
