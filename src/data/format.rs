//! Number and label formatting
//!
//! Amounts use the grouping conventions of each currency's locale (en-US for
//! USD, id-ID for IDR) with at most three fraction digits.

use super::Currency;

/// Maximum fraction digits shown for an amount
const MAX_FRACTION_DIGITS: usize = 3;

fn separators(currency: Currency) -> (char, char) {
    match currency {
        Currency::Usd => (',', '.'),
        Currency::Idr => ('.', ','),
    }
}

/// Formats a number with locale grouping, e.g. `95,420.5` or `95.420,5`
pub fn format_number(value: f64, currency: Currency) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let (group_sep, decimal_sep) = separators(currency);
    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && (!int_part.trim_start_matches('0').is_empty() || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push(decimal_sep);
        out.push_str(frac_part);
    }
    out
}

/// Formats an amount with its currency symbol, e.g. `$95,420` or `Rp 1.431.300.000`
pub fn format_money(value: f64, currency: Currency) -> String {
    format!("{}{}", currency.symbol(), format_number(value, currency))
}

/// Change tag text, e.g. `+1.25%` or `-0.45%`
pub fn format_change_tag(change: f64) -> String {
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, change)
}

/// Table status pill, e.g. `▲ 1.25%` or `▼ 0.45%`
pub fn format_change_pill(change: f64) -> String {
    let arrow = if change >= 0.0 { '▲' } else { '▼' };
    format!("{} {:.2}%", arrow, change.abs())
}
