//! Money formatting and parsing using rust_decimal for precision
//!
//! Amounts are entered by hand and stored verbatim; there is no currency
//! conversion anywhere. Formatting follows en-US currency style.

use std::str::FromStr;

use rust_decimal::prelude::*;
use shared::models::Currency;

use super::{AppError, AppResult};

/// Maximum amount accepted for a single entry
const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Format an amount in the given currency (`$1,234.50`, `¥1,235`)
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let digits = currency.fraction_digits();
    let rounded = amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let body = format!("{:.*}", digits as usize, rounded.abs());
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body.as_str(), None),
    };

    let mut out = String::with_capacity(body.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(currency.prefix());
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Validate a manually entered amount (non-negative, bounded)
pub fn validate_amount(amount: Decimal, field: &str) -> AppResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::invalid_amount(format!(
            "{field} must be non-negative, got {amount}"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(AppError::invalid_amount(format!(
            "{field} exceeds maximum allowed ({MAX_AMOUNT}), got {amount}"
        )));
    }
    Ok(amount)
}

/// Parse a form amount field; blank input means "no amount"
pub fn parse_amount(input: &str, field: &str) -> AppResult<Option<Decimal>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let amount = Decimal::from_str(trimmed).map_err(|_| {
        AppError::invalid_amount(format!("{field} is not a number: {trimmed}"))
            .with_detail("field", field)
    })?;
    validate_amount(amount, field).map(Some)
}

/// Sum amounts without floating point drift
pub fn sum<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, |acc, a| acc + *a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_currency(dec("100"), Currency::Usd), "$100.00");
        assert_eq!(format_currency(dec("1234.5"), Currency::Usd), "$1,234.50");
        assert_eq!(format_currency(dec("1234567.891"), Currency::Usd), "$1,234,567.89");
        assert_eq!(format_currency(dec("0"), Currency::Usd), "$0.00");
    }

    #[test]
    fn test_format_rounding_half_away_from_zero() {
        assert_eq!(format_currency(dec("2.005"), Currency::Usd), "$2.01");
        assert_eq!(format_currency(dec("-2.005"), Currency::Usd), "-$2.01");
    }

    #[test]
    fn test_format_other_currencies() {
        assert_eq!(format_currency(dec("15"), Currency::Eur), "€15.00");
        assert_eq!(format_currency(dec("15"), Currency::Gbp), "£15.00");
        assert_eq!(format_currency(dec("1500"), Currency::Inr), "₹1,500.00");
        assert_eq!(format_currency(dec("1234.5"), Currency::Jpy), "¥1,235");
        assert_eq!(format_currency(dec("50"), Currency::Myr), "MYR\u{a0}50.00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("", "amount").unwrap(), None);
        assert_eq!(parse_amount(" 15.50 ", "amount").unwrap(), Some(dec("15.50")));
        let err = parse_amount("abc", "amount").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        let err = parse_amount("-5", "amount").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
    }

    #[test]
    fn test_sum_is_exact() {
        let amounts = vec![dec("0.1"), dec("0.2")];
        assert_eq!(sum(&amounts), dec("0.3"));
    }
}
