use rust_decimal::Decimal;

/// Lenient coercion of a cell value to a decimal amount.
/// Thousands separators are stripped; anything else unparsable yields `None`
/// so callers can fall back to their documented default.
pub fn coerce(value: &str) -> Option<Decimal> {
    let cleaned = value.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Render an amount the way the sheet stores it: two decimal places,
/// sign preserved.
pub fn format_2dp(amount: Decimal) -> String {
    format!("{amount:.2}")
}
