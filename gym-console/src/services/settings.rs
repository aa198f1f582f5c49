//! Display currency setting

use shared::models::{Currency, SystemConfig};

use crate::db::repository::{TenantDb, settings};
use crate::utils::{AppError, AppResult};

/// Set the process-wide display currency; last write wins
pub async fn set_currency(db: &TenantDb, currency: Currency) -> AppResult<SystemConfig> {
    let config = settings::set_currency(db, currency).await.map_err(|e| {
        tracing::error!(currency = %currency, error = %e, "Failed to save currency");
        AppError::from(e)
    })?;
    tracing::info!(currency = %config.currency, version = config.version, "Currency updated");
    Ok(config)
}

/// Parse a currency code and save it
pub async fn set_currency_code(db: &TenantDb, code: &str) -> AppResult<SystemConfig> {
    let currency: Currency = code.parse()?;
    set_currency(db, currency).await
}

/// Stored currency, or `fallback` before the first save
pub async fn current_currency(db: &TenantDb, fallback: Currency) -> AppResult<Currency> {
    Ok(settings::get_config(db)
        .await?
        .map_or(fallback, |c| c.currency))
}
