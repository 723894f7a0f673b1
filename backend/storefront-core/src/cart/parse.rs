//! Lenient number parsing for user-entered cart values.
//!
//! Input is read the way a browser form hands it over: leading whitespace is
//! skipped, the longest numeric prefix is taken and anything after it is
//! ignored (`"2.5 kg"` is `2.5`). Only input without any numeric prefix is
//! rejected. The first comma counts as the decimal separator.

/// Parse a price such as `"2,50"`, `" 3.1"` or `"4 EUR"`.
pub fn parse_price(text: &str) -> Option<f64> {
    let normalized = text.replacen(',', ".", 1);
    let prefix = leading_decimal(normalized.trim_start())?;
    prefix.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse a quantity such as `"3"`, `"-1"` or `"2.7"` (which yields 2).
pub fn parse_quantity(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    if end == digits_start {
        return None;
    }
    trimmed[..end].parse().ok()
}

/// Two-decimal fixed string, e.g. `9.5` → `"9.50"`.
///
/// Values exactly halfway between two cents round away from zero
/// (`0.125` → `"0.13"`), matching what a browser prints for the same cart.
pub fn to_fixed_2(value: f64) -> String {
    // -0.0 prints as "-0.00"
    let value = if value == 0.0 { 0.0 } else { value };
    match halfway_cents(value.abs()) {
        Some(cents) => {
            let sign = if value < 0.0 { "-" } else { "" };
            format!("{sign}{}.{:02}", cents / 100, cents % 100)
        }
        None => format!("{value:.2}"),
    }
}

/// Rounded-up cents for a value exactly halfway between two cents.
///
/// In binary only odd multiples of 1/8 land on a half cent, and for those
/// `value * 8` is an exact odd integer.
fn halfway_cents(value: f64) -> Option<u128> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    let eighths = value * 8.0;
    if eighths.fract() != 0.0 || eighths % 2.0 != 1.0 || eighths >= MAX_EXACT {
        return None;
    }
    // eighths / 8 * 100 = 12.5 * eighths, so the next cent up is (25 * eighths + 1) / 2
    let eighths = eighths as u128;
    Some((25 * eighths + 1) / 2)
}

fn leading_decimal(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let digits_until = |mut at: usize| {
        while at < len && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_until(end);
    let mut digits = int_end - end;
    end = int_end;

    if end < len && bytes[end] == b'.' {
        let frac_end = digits_until(end + 1);
        let frac_digits = frac_end - (end + 1);
        if digits > 0 || frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_at = end + 1;
        if exp_at < len && matches!(bytes[exp_at], b'+' | b'-') {
            exp_at += 1;
        }
        let exp_end = digits_until(exp_at);
        if exp_end > exp_at {
            end = exp_end;
        }
    }

    Some(&text[..end])
}
