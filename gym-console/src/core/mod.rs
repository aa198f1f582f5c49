//! 核心模块 - 配置与确认

pub mod config;
pub mod confirm;

pub use config::Config;
pub use confirm::Confirmation;
