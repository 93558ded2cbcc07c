//! Time utilities for dockhand
//!
//! Provides monotonic time for timeout enforcement, wall-clock time for
//! logging, and duration parsing/rendering in Go notation.
//!
//! # Duration notation
//!
//! Durations are written as a sequence of decimal numbers, each with an
//! optional fraction and a unit suffix: `300ms`, `1.5h`, `2h45m`. Valid units
//! are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. The bare string `0` is also
//! accepted. Rendering produces the canonical form, so `1s` stays `1s` and
//! `90s` becomes `1m30s`.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

use crate::{DurationParseError, DurationResult};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Fraction digits beyond this cannot change a nanosecond result.
const MAX_FRACTION_DIGITS: usize = 18;

/// Longest representable duration: `2562047h47m16.854775807s`.
pub const MAX_DURATION_NANOS: u128 = i64::MAX as u128;

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Represents a point in monotonic time for timeout enforcement.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    pub fn checked_add(&self, duration: Duration) -> Option<MonotonicInstant> {
        self.0.checked_add(duration).map(MonotonicInstant)
    }

    pub fn into_std(self) -> Instant {
        self.0
    }
}

/// Render a duration in Go notation (`0s`, `500ms`, `1s`, `1m30s`, `2h0m0s`).
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", format_fraction(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", format_fraction(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = format_fraction(nanos % NANOS_PER_MIN, NANOS_PER_SEC);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// `value / unit` as a decimal with trailing zeros removed.
fn format_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{:0width$}", rem, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a duration written in Go notation.
///
/// Negative durations are rejected; a timeout cannot be negative.
pub fn parse_duration(input: &str) -> DurationResult<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if s.starts_with('-') {
        return Err(DurationParseError::Negative(input.to_string()));
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(DurationParseError::InvalidNumber(input.to_string()));
    }

    let mut rest = s;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| DurationParseError::MissingUnit(input.to_string()))?;
        let (number, tail) = rest.split_at(number_end);

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let unit_nanos = unit_nanos(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let component = parse_component(number, unit_nanos)
            .ok_or_else(|| DurationParseError::InvalidNumber(input.to_string()))?
            .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;

        total = total
            .checked_add(component)
            .filter(|total| *total <= MAX_DURATION_NANOS)
            .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| DurationParseError::Overflow(input.to_string()))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Outer `None`: malformed number. Inner `None`: overflow.
fn parse_component(number: &str, unit_nanos: u128) -> Option<Option<u128>> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        match whole.parse() {
            Ok(v) => v,
            Err(_) => return Some(None),
        }
    };

    let Some(mut nanos) = whole.checked_mul(unit_nanos) else {
        return Some(None);
    };

    if !fraction.is_empty() {
        let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
        let value: u128 = digits.parse().ok()?;
        let scale = 10u128.pow(digits.len() as u32);
        nanos = match nanos.checked_add(value * unit_nanos / scale) {
            Some(v) => v,
            None => return Some(None),
        };
    }

    Some(Some(nanos))
}
