//! Settings Models
//!
//! - `settings/config`: process-wide display currency (last write wins)
//! - `settings/system`: one-way first-run flag

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Display currency (结算币种)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Inr,
    Myr,
    Jpy,
}

impl Currency {
    /// Currencies offered in settings
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Inr,
        Currency::Myr,
        Currency::Jpy,
    ];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Myr => "MYR",
            Currency::Jpy => "JPY",
        }
    }

    /// Prefix used by en-US currency formatting
    pub fn prefix(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Inr => "₹",
            Currency::Myr => "MYR\u{a0}",
            Currency::Jpy => "¥",
        }
    }

    /// Minor unit digits
    pub fn fraction_digits(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::CurrencyNotSupported,
                    format!("Currency {} is not supported", s.trim()),
                )
                .with_detail("currency", s.trim())
            })
    }
}

impl TryFrom<String> for Currency {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

/// `settings/config` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub currency: Currency,
    /// Bumped on every write; informational, no conflict detection
    #[serde(default)]
    pub version: u64,
}

/// `settings/system` document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub initialized: bool,
}
