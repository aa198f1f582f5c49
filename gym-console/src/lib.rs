//! Gym Console - 健身房会员与收入管理控制台
//!
//! # 架构概述
//!
//! 控制台是托管实时文档库与认证服务之上的一层业务逻辑：
//!
//! - **订阅生命周期** (`subscription`): 续费日期计算、到期分级、原子提交
//! - **流水账** (`ledger`): 订阅付款与访客费用，只追加/删除
//! - **报表** (`reports`): 仪表盘统计、月度报表
//! - **访问控制** (`auth`): 首次启动引导、登录路由
//! - **实时同步** (`sync`): 集合订阅与本地缓存
//!
//! # 模块结构
//!
//! ```text
//! gym-console/src/
//! ├── core/          # 配置、确认
//! ├── db/            # 文档库接口、内存实现、仓储
//! ├── subscription/  # 续费计算、分级、提交
//! ├── ledger/        # 流水账
//! ├── reports/       # 统计与报表
//! ├── auth/          # 访问控制、凭证提供方
//! ├── services/      # 会员视图、员工、设置
//! ├── sync/          # 实时缓存
//! ├── console.rs     # 门面
//! └── utils/         # 时间、金额、校验、日志
//! ```

pub mod auth;
pub mod console;
pub mod core;
pub mod db;
pub mod ledger;
pub mod reports;
pub mod services;
pub mod subscription;
pub mod sync;
pub mod utils;

// Re-export 公共类型
pub use auth::{AccessGate, CredentialProvider, GateState, LoginOutcome, MemoryCredentialProvider};
pub use console::GymConsole;
pub use core::{Config, Confirmation};
pub use db::{DocumentStore, MemoryStore};
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),+) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),+
        );
    };
}

/// 设置日志 (在 `Config::from_env` 之后调用)
pub fn setup_environment(config: &Config) {
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.json_logs()),
        config.log_dir.as_deref(),
    );
}

pub fn print_banner() {
    println!(
        r#"
   ______                   ______                       __
  / ____/_  ______ ___     / ____/___  ____  _________  / /__
 / / __/ / / / __ `__ \   / /   / __ \/ __ \/ ___/ __ \/ / _ \
/ /_/ / /_/ / / / / / /  / /___/ /_/ / / / (__  ) /_/ / /  __/
\____/\__, /_/ /_/ /_/   \____/\____/_/ /_/____/\____/_/\___/
     /____/
    "#
    );
}
