//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - 日期/金额格式化与日历计算
//! - 表单校验、日志

pub mod logger;
pub mod money;
pub mod time;
pub mod validation;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode, Presentation};
