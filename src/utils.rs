use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

const THOUSAND: f64 = 1e3;
const MILLION: f64 = 1e6;
const BILLION: f64 = 1e9;
const TRILLION: f64 = 1e12;

const TIERS: [(f64, &str); 5] = [
    (1.0, ""),
    (THOUSAND, "K"),
    (MILLION, "M"),
    (BILLION, "B"),
    (TRILLION, "T"),
];

pub const NOT_AVAILABLE: &str = "n/a";

fn round_decimal(value: f64, dp: u32) -> Option<Decimal> {
    // Display gives the shortest round-tripping form, so 2.675 stays 2.675.
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

/// Rounds half away from zero in decimal and renders between `min_dp` and
/// `max_dp` fraction digits, optionally grouping the integer part by thousands.
///
/// Values beyond the decimal range fall back to float formatting with
/// `min_dp` digits. NaN and infinities render as `n/a`.
pub fn format_number(value: f64, min_dp: u32, max_dp: u32, grouped: bool) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let (negative, digits) = match round_decimal(value, max_dp) {
        Some(decimal) => (
            decimal.is_sign_negative() && !decimal.is_zero(),
            decimal.abs().normalize().to_string(),
        ),
        None => (value < 0.0, format!("{:.*}", min_dp as usize, value.abs())),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut frac = frac_part.to_string();
    while frac.len() < min_dp as usize {
        frac.push('0');
    }

    let int_part = if grouped {
        group_thousands(int_part)
    } else {
        int_part.to_string()
    };

    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn with_dollar(number: String) -> String {
    if number == NOT_AVAILABLE {
        return number;
    }
    match number.strip_prefix('-') {
        Some(abs) => format!("-${abs}"),
        None => format!("${number}"),
    }
}

/// `$1,234.50`
pub fn currency_2(value: f64) -> String {
    with_dollar(format_number(value, 2, 2, true))
}

/// `$1,234.5678`, at least 2 and at most 6 fraction digits.
pub fn currency_2_to_6(value: f64) -> String {
    with_dollar(format_number(value, 2, 6, true))
}

/// `1.50M`, `-2.00K`, `12.30`. The suffix follows the rounded mantissa, so
/// 999,999 renders as `1.00M`.
pub fn abbreviated(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let num = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    let mut tier = TIERS.iter().rposition(|(divisor, _)| num >= *divisor).unwrap_or(0);
    let thousand = Decimal::from(1000);
    if tier + 1 < TIERS.len()
        && round_decimal(num / TIERS[tier].0, 2).is_some_and(|mantissa| mantissa >= thousand)
    {
        tier += 1;
    }

    let (divisor, suffix) = TIERS[tier];
    let mantissa = format_number(num / divisor, 2, 2, false);
    if mantissa == "0.00" {
        return mantissa;
    }
    format!("{sign}{mantissa}{suffix}")
}

/// `$` followed by the abbreviated value, or `$` alone when absent.
pub fn currency_abbreviated(value: Option<f64>) -> String {
    format!("${}", value.map(abbreviated).unwrap_or_default())
}

/// `45.12%`
pub fn percent(value: f64) -> String {
    let number = format_number(value, 2, 2, false);
    if number == NOT_AVAILABLE {
        return number;
    }
    format!("{number}%")
}
