//! Number ↔ text conversions shared by `toStr`, JSON and the printer.

/// Equivalent of C's `%.{precision}g`.
pub fn format_g(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, x);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_fraction_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Rendering used by `toStr` and string concatenation: whole numbers below
/// 1e15 without a decimal point, everything else `%.16g`.
pub fn to_display(n: f64) -> String {
    if n.is_finite() && n.floor() == n && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format_g(n, 16)
    }
}

/// Printer rendering: clears float noise and spells out the IEEE specials.
pub fn smart(n: f64) -> String {
    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    let rounded = n.round();
    if (n - rounded).abs() < 1e-9 && rounded.abs() < 1e15 {
        return format!("{:.0}", rounded);
    }
    if n.abs() < 1e-4 || n.abs() >= 1e15 {
        return format_g(n, 16);
    }
    for precision in 1..=15 {
        let candidate = truncate_fixed(n, precision);
        let close = candidate
            .parse::<f64>()
            .map(|reparsed| (reparsed - n).abs() < 1e-15)
            .unwrap_or(false);
        if close {
            return strip_fraction_zeros(&candidate).to_string();
        }
    }
    format_g(n, 16)
}

/// Fixed-point with `precision` decimals, truncated rather than rounded.
pub fn truncate_fixed(n: f64, precision: usize) -> String {
    let mut text = format!("{:.*}", precision + 2, n);
    if let Some(dot) = text.find('.') {
        let keep = if precision == 0 { dot } else { dot + 1 + precision };
        text.truncate(keep);
    }
    text
}

/// Best-effort numeric prefix parse (`sscanf("%lf")`): leading whitespace is
/// skipped, trailing garbage ignored, no digits at all yields 0.
pub fn parse_lossy(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let lower = trimmed[end..].to_ascii_lowercase();
    for special in ["infinity", "inf", "nan"] {
        if lower.starts_with(special) {
            return trimmed[..end + special.len()].parse().unwrap_or(0.0);
        }
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &trimmed[digits_start..end] == "." {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    trimmed[..end].parse().unwrap_or(0.0)
}

/// Strict parse used by `toNum`: leading whitespace allowed, nothing after.
pub fn parse_strict(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}
