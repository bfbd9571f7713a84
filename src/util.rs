// Numeric helpers shared by the analysis modules.
//
// Billing exports are messy: blank cells, stray text, thousands separators.
// Everything that turns a cell into a number goes through here so the
// calculators only ever see finite `f64` values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts scientific notation (`1e3`, `1.5E-02`), which cloud cost
///   exports use for small amounts.
/// - Returns `None` for anything that cannot be safely parsed, including
///   `nan` and `inf`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Best-effort coercion: missing or unparsable cells become `0.0`.
pub fn coerce_f64(s: Option<&str>) -> f64 {
    parse_f64_safe(s).unwrap_or(0.0)
}

/// Round to a fixed number of decimals, ties to even.
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let r = (v * factor).round_ties_even() / factor;
    // avoid printing "-0.00"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

pub fn round2(v: f64) -> f64 {
    round_to(v, 2)
}

pub fn round1(v: f64) -> f64 {
    round_to(v, 1)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators
    // (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
