//! Durations and byte sizes as written in Compose files.

use std::fmt;
use std::str::FromStr;
use std::time;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ComposeError;

static SIZE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?) ?([kKmMgGtTpP])?[iI]?[bB]?$").expect("valid size pattern")
});

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// A duration written in Go notation (`1h2m3.5s`, `300ms`, `10us`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(pub time::Duration);

impl Duration {
    pub fn from_nanos(nanos: u64) -> Self {
        Self(time::Duration::from_nanos(nanos))
    }

    pub fn as_std(&self) -> time::Duration {
        self.0
    }
}

impl FromStr for Duration {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
            .map(Duration)
            .ok_or_else(|| ComposeError::InvalidDuration(s.to_string()))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }
        if nanos < NANOS_PER_MICRO {
            return write!(f, "{}ns", nanos);
        }
        if nanos < NANOS_PER_MILLI {
            return write!(f, "{}µs", fraction(nanos, NANOS_PER_MICRO));
        }
        if nanos < NANOS_PER_SEC {
            return write!(f, "{}ms", fraction(nanos, NANOS_PER_MILLI));
        }

        let hours = nanos / NANOS_PER_HOUR;
        let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
        let rest = nanos % NANOS_PER_MIN;
        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        write!(f, "{}s", fraction(rest, NANOS_PER_SEC))
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A memory size in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UnitBytes(pub i64);

impl FromStr for UnitBytes {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ram_in_bytes(s)
            .map(UnitBytes)
            .ok_or_else(|| ComposeError::InvalidSize(s.to_string()))
    }
}

/// Parse a human readable size with binary multiples (`64m`, `1.5GiB`).
pub fn ram_in_bytes(s: &str) -> Option<i64> {
    let captures = SIZE_PATTERN.captures(s.trim())?;
    let number: f64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier: f64 = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => 1.0,
        Some(unit) => match unit.as_str() {
            "k" => 1024.0,
            "m" => 1024.0 * 1024.0,
            "g" => 1024.0 * 1024.0 * 1024.0,
            "t" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
            "p" => 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
            _ => return None,
        },
    };
    let bytes = number * multiplier;
    if bytes > i64::MAX as f64 {
        return None;
    }
    Some(bytes as i64)
}

/// Parse a Go duration string. A lone `0` needs no unit.
pub fn parse_duration(s: &str) -> Option<time::Duration> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(time::Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            _ => return None,
        };
        total = total.checked_add(scaled(number, scale)?)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
    Some(time::Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

fn scaled(number: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = match number.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(scale)?;
    if !frac.is_empty() {
        let digits = &frac[..frac.len().min(18)];
        let numerator: u128 = digits.parse().ok()?;
        let denominator = 10u128.pow(digits.len() as u32);
        value = value.checked_add(numerator * scale / denominator)?;
    }
    Some(value)
}

fn fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rest = value % unit;
    if rest == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", rest, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Duration {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(d("1m30s").as_std(), time::Duration::from_secs(90));
        assert_eq!(d("300ms").as_std(), time::Duration::from_millis(300));
        assert_eq!(d("1.5h").as_std(), time::Duration::from_secs(5400));
        assert_eq!(d("10us").as_std(), time::Duration::from_micros(10));
        assert_eq!(d("0").as_std(), time::Duration::ZERO);
        assert!("10".parse::<Duration>().is_err());
        assert!("${timeout}".parse::<Duration>().is_err());
        assert!("-5s".parse::<Duration>().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(d("90s").to_string(), "1m30s");
        assert_eq!(d("1h").to_string(), "1h0m0s");
        assert_eq!(d("2.5s").to_string(), "2.5s");
        assert_eq!(d("300ms").to_string(), "300ms");
        assert_eq!(d("1500us").to_string(), "1.5ms");
        assert_eq!(Duration::from_nanos(5).to_string(), "5ns");
        assert_eq!(Duration::default().to_string(), "0s");
    }

    #[test]
    fn test_ram_in_bytes() {
        assert_eq!(ram_in_bytes("512"), Some(512));
        assert_eq!(ram_in_bytes("64m"), Some(64 * 1024 * 1024));
        assert_eq!(ram_in_bytes("1GiB"), Some(1024 * 1024 * 1024));
        assert_eq!(ram_in_bytes("1.5k"), Some(1536));
        assert_eq!(ram_in_bytes("32 MB"), Some(32 * 1024 * 1024));
        assert_eq!(ram_in_bytes("${memory}"), None);
        assert_eq!(ram_in_bytes("12x"), None);
    }
}
