//! Duration strings: `"168h"`, `"30m"`, `"1h30m"`, `"1.5h"`, `"7d"`.
//!
//! Accepted units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`, `d`. Components may
//! be chained and may carry a decimal fraction. Zero and negative durations
//! are rejected since a retention window of nothing is never intended.

use std::time::Duration;

use thiserror::Error;

/// Fraction digits beyond this are ignored.
const MAX_FRACTION_DIGITS: usize = 18;

/// Why a duration string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,
    #[error("negative duration: {0}")]
    Negative(String),
    #[error("invalid number in duration: {0}")]
    InvalidNumber(String),
    #[error("duration component missing unit (ns/us/ms/s/m/h/d): {0}")]
    MissingUnit(String),
    #[error("unknown duration unit: {0}")]
    UnknownUnit(String),
    #[error("duration must be greater than zero")]
    Zero,
    #[error("duration out of range: {0}")]
    Overflow(String),
}

/// Parse a duration string.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(DurationError::Negative(trimmed.to_string()));
    }

    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        if unit.is_empty() {
            return Err(DurationError::MissingUnit(trimmed.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit(unit.to_string()))?;
        let nanos = scaled_nanos(number, scale)
            .ok_or_else(|| DurationError::InvalidNumber(number.to_string()))?;

        total = total
            .checked_add(nanos)
            .ok_or_else(|| DurationError::Overflow(trimmed.to_string()))?;
    }

    if total == 0 {
        return Err(DurationError::Zero);
    }
    let nanos = u64::try_from(total).map_err(|_| DurationError::Overflow(trimmed.to_string()))?;
    Ok(Duration::from_nanos(nanos))
}

/// Nanoseconds per unit.
fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 60 * 60 * 1_000_000_000,
        "d" => 24 * 60 * 60 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// `number * scale` in integer arithmetic, where `number` is `123` or `1.25`.
fn scaled_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let denominator = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits.checked_mul(scale)? / denominator)?;
    }
    Some(nanos)
}
