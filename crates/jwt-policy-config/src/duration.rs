//! Duration strings used by the policy wire format.
//!
//! # Design
//! - Accepts the compact `<number><unit>` grammar (`24h`, `1h30m`, `1.5s`, `250ms`).
//! - Renders the canonical form (`24h0m0s`), which always parses back to the same value.
//! - Caps values at `i64::MAX` nanoseconds so rendered values stay portable.

use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;
/// Largest accepted value, in nanoseconds (`i64::MAX`).
const MAX_NANOS: u128 = 9_223_372_036_854_775_807;
/// Fraction digits beyond this are below nanosecond precision for every unit.
const MAX_FRACTION_DIGITS: usize = 20;

/// Reasons a duration string can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationError {
    /// The input was empty.
    Empty,
    /// A term had a unit but no digits.
    MissingNumber,
    /// A term had digits but no unit.
    MissingUnit,
    /// A term used a unit outside `ns`, `us`, `ms`, `s`, `m`, `h`.
    UnknownUnit,
    /// The value exceeded the representable range.
    Overflow,
    /// The value was negative.
    Negative,
}

impl DurationError {
    /// Machine-readable reason suitable for error payloads.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Empty => "empty duration",
            Self::MissingNumber => "missing number before unit",
            Self::MissingUnit => "missing unit in duration",
            Self::UnknownUnit => "unknown unit in duration",
            Self::Overflow => "duration out of range",
            Self::Negative => "duration must not be negative",
        }
    }
}

/// Parse a duration string such as `24h`, `15m` or `1h30m0.5s`.
///
/// A leading `+` is accepted; a leading `-` is rejected unless the value is zero.
/// The bare string `0` is zero.
///
/// # Errors
///
/// Returns a [`DurationError`] describing the first malformed term.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, after_int) = rest.split_at(int_len);
        let (frac_digits, after_frac) = after_int.strip_prefix('.').map_or(("", after_int), |tail| {
            let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
            tail.split_at(frac_len)
        });
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(DurationError::MissingNumber);
        }

        let unit_len = after_frac
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_frac.len());
        let (unit, tail) = after_frac.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit);
        }
        let scale = unit_scale(unit).ok_or(DurationError::UnknownUnit)?;

        let whole = parse_digits(int_digits)?
            .checked_mul(scale)
            .ok_or(DurationError::Overflow)?;
        total = total
            .checked_add(whole)
            .and_then(|value| value.checked_add(scale_fraction(frac_digits, scale)))
            .filter(|value| *value <= MAX_NANOS)
            .ok_or(DurationError::Overflow)?;
        rest = tail;
    }

    if negative && total > 0 {
        return Err(DurationError::Negative);
    }

    let nanos = u64::try_from(total).map_err(|_| DurationError::Overflow)?;
    Ok(Duration::from_nanos(nanos))
}

/// Render a duration in canonical form (`24h0m0s`, `1.5s`, `250ms`, `0s`).
#[must_use]
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SECOND {
        let (scale, unit) = if nanos < NANOS_PER_MICRO {
            (1, "ns")
        } else if nanos < NANOS_PER_MILLI {
            (NANOS_PER_MICRO, "µs")
        } else {
            (NANOS_PER_MILLI, "ms")
        };
        return format!("{}{unit}", decimal(nanos, scale));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = decimal(nanos % NANOS_PER_MINUTE, NANOS_PER_SECOND);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

fn parse_digits(digits: &str) -> Result<u128, DurationError> {
    digits.bytes().try_fold(0_u128, |acc, digit| {
        acc.checked_mul(10)
            .and_then(|value| value.checked_add(u128::from(digit - b'0')))
            .ok_or(DurationError::Overflow)
    })
}

fn scale_fraction(digits: &str, scale: u128) -> u128 {
    let kept = &digits[..digits.len().min(MAX_FRACTION_DIGITS)];
    let (value, divisor) = kept.bytes().fold((0_u128, 1_u128), |(value, divisor), digit| {
        (value * 10 + u128::from(digit - b'0'), divisor * 10)
    });
    value * scale / divisor
}

fn decimal(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
