//! Conversion of decimal prices into integer minor currency units.

use serde_json::Value;

use crate::error::AppError;

/// Largest amount (in minor units) accepted by the payment provider.
pub const MAX_AMOUNT: i64 = 99_999_999;

/// Currencies without a fractional minor unit.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Number of decimal places in one major unit of `currency`.
pub fn minor_unit_exponent(currency: &str) -> u32 {
    let currency = currency.to_ascii_lowercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.as_str()) {
        0
    } else {
        2
    }
}

/// Parse a price given either as a JSON number or a numeric string.
pub fn parse_price(price: &Value) -> Result<f64, AppError> {
    let parsed = match price {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(p) if p.is_finite() => Ok(p),
        _ => Err(AppError::InvalidInput(format!(
            "price must be a number, got {price}"
        ))),
    }
}

/// Convert a decimal `price` into the integer amount charged in `currency`.
///
/// The result is rounded to the nearest minor unit, so `19.99` becomes `1999`
/// even though `19.99 * 100.0` is not exactly representable.
pub fn to_minor_units(price: &Value, currency: &str) -> Result<i64, AppError> {
    let price = parse_price(price)?;
    if price <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "price must be positive, got {price}"
        )));
    }

    let scale = 10f64.powi(minor_unit_exponent(currency) as i32);
    let amount = (price * scale).round();
    if amount < 1.0 {
        return Err(AppError::InvalidInput(format!(
            "price {price} is below the smallest {currency} unit"
        )));
    }
    if amount > MAX_AMOUNT as f64 {
        return Err(AppError::InvalidInput(format!(
            "amount {amount} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }

    Ok(amount as i64)
}
