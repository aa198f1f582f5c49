use chrono_tz::Tz;
use shared::models::Currency;

/// 控制台配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | GYM_TENANT_ID | default-gym | 租户命名空间 |
/// | GYM_TIMEZONE | UTC | 业务时区 (月/日统计边界) |
/// | GYM_DEFAULT_CURRENCY | USD | `settings/config` 不存在时的币种 |
/// | GYM_BOOTSTRAP_USERNAME | admin | 首次启动哨兵账号 |
/// | GYM_BOOTSTRAP_PASSWORD | admin | 首次启动哨兵密码 |
/// | GYM_MIN_PASSWORD_LEN | 6 | 新账号最短密码 |
/// | GYM_RECENT_TRANSACTIONS | 5 | 仪表盘最近流水条数 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (不设置则输出到 stdout) |
/// | LOG_JSON | false | JSON 格式日志 (生产环境总是开启) |
/// | ENVIRONMENT | development | 运行环境 |
#[derive(Debug, Clone)]
pub struct Config {
    /// Tenant namespace segment for every document path
    pub tenant_id: String,
    /// Business timezone used for calendar month/day bucketing
    pub timezone: Tz,
    /// Currency shown until one is stored
    pub default_currency: Currency,
    /// Sentinel credential that opens first-run setup
    pub bootstrap_username: String,
    pub bootstrap_password: String,
    /// Minimum secret length for new credentials
    pub min_password_len: usize,
    /// Dashboard "recent activity" length
    pub recent_transactions: usize,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub log_json: bool,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 无法解析的值回退到默认值并记录警告
    pub fn from_env() -> Self {
        Self {
            tenant_id: std::env::var("GYM_TENANT_ID").unwrap_or_else(|_| "default-gym".into()),
            timezone: std::env::var("GYM_TIMEZONE")
                .ok()
                .and_then(|tz| {
                    tz.parse().ok().or_else(|| {
                        tracing::warn!("Invalid GYM_TIMEZONE '{}', falling back to UTC", tz);
                        None
                    })
                })
                .unwrap_or(Tz::UTC),
            default_currency: std::env::var("GYM_DEFAULT_CURRENCY")
                .ok()
                .and_then(|c| {
                    c.parse().ok().or_else(|| {
                        tracing::warn!("Invalid GYM_DEFAULT_CURRENCY '{}', falling back to USD", c);
                        None
                    })
                })
                .unwrap_or_default(),
            bootstrap_username: std::env::var("GYM_BOOTSTRAP_USERNAME")
                .unwrap_or_else(|_| "admin".into()),
            bootstrap_password: std::env::var("GYM_BOOTSTRAP_PASSWORD")
                .unwrap_or_else(|_| "admin".into()),
            min_password_len: std::env::var("GYM_MIN_PASSWORD_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            recent_transactions: std::env::var("GYM_RECENT_TRANSACTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(tenant_id: impl Into<String>, timezone: Tz) -> Self {
        let mut config = Self::from_env();
        config.tenant_id = tenant_id.into();
        config.timezone = timezone;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// JSON 日志: LOG_JSON 或生产环境
    pub fn json_logs(&self) -> bool {
        self.log_json || self.is_production()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
