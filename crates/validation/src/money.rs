pub const CURRENCY: &str = "RM";

/// Largest amount a single record may carry, in currency units. Keeps every
/// monthly sum of cents far inside `i64`.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Wire amounts are decimal currency units; storage is integer cents.
pub fn to_cents(amount: f64) -> Result<i64, String> {
    if !amount.is_finite() || amount.abs() > MAX_AMOUNT {
        return Err(format!("Amount must be at most {}{:.0}", CURRENCY, MAX_AMOUNT));
    }
    Ok((amount * 100.0).round() as i64)
}

pub fn to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}{}.{:02}", sign, CURRENCY, abs / 100, abs % 100)
}
