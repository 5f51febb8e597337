//! Values that are either concrete or a deferred template expression.
//!
//! A field such as `privileged: ${debug}` cannot be decoded as a boolean until
//! the variable is resolved. [`OrTemplate`] keeps the expression verbatim so
//! the document can be loaded without resolving anything, then re-encoded
//! with the expression intact.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value;

use appdef_settings::value_kind;

use crate::units::{parse_duration, ram_in_bytes, Duration, UnitBytes};

/// Mapping key holding a concrete value in the serialized form.
pub const VALUE_KEY: &str = "value";
/// Mapping key holding a template expression in the serialized form.
pub const TEMPLATE_KEY: &str = "valuetemplate";

/// A concrete value or an unresolved expression.
#[derive(Debug, Clone, PartialEq)]
pub enum OrTemplate<T> {
    Value(T),
    Template(String),
}

pub type BoolOrTemplate = OrTemplate<bool>;
pub type UInt64OrTemplate = OrTemplate<u64>;
pub type UnitBytesOrTemplate = OrTemplate<UnitBytes>;
pub type DurationOrTemplate = OrTemplate<Duration>;

impl<T> OrTemplate<T> {
    pub fn is_template(&self) -> bool {
        matches!(self, OrTemplate::Template(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OrTemplate::Value(v) => Some(v),
            OrTemplate::Template(_) => None,
        }
    }

    pub fn template(&self) -> Option<&str> {
        match self {
            OrTemplate::Value(_) => None,
            OrTemplate::Template(t) => Some(t),
        }
    }
}

impl<T: Default> Default for OrTemplate<T> {
    fn default() -> Self {
        OrTemplate::Value(T::default())
    }
}

impl<T: Serialize> Serialize for OrTemplate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            OrTemplate::Value(v) => map.serialize_entry(VALUE_KEY, v)?,
            OrTemplate::Template(t) => map.serialize_entry(TEMPLATE_KEY, t)?,
        }
        map.end()
    }
}

impl<'de, T: TemplateScalar> Deserialize<'de> for OrTemplate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        T::transform(raw).map_err(de::Error::custom)
    }
}

/// A primitive that can sit in an [`OrTemplate`].
///
/// Each implementation names its field transform, which tries a strict parse
/// and only treats strings as templates when that parse fails.
pub trait TemplateScalar: Sized + Default {
    fn transform(raw: Value) -> Result<OrTemplate<Self>, String>;
}

impl TemplateScalar for bool {
    fn transform(raw: Value) -> Result<OrTemplate<Self>, String> {
        transform_bool(raw)
    }
}

impl TemplateScalar for u64 {
    fn transform(raw: Value) -> Result<OrTemplate<Self>, String> {
        transform_uint64(raw)
    }
}

impl TemplateScalar for UnitBytes {
    fn transform(raw: Value) -> Result<OrTemplate<Self>, String> {
        transform_size(raw)
    }
}

impl TemplateScalar for Duration {
    fn transform(raw: Value) -> Result<OrTemplate<Self>, String> {
        transform_duration(raw)
    }
}

/// Integers are true when non-zero; strings follow YAML 1.1 booleans.
pub fn transform_bool(raw: Value) -> Result<BoolOrTemplate, String> {
    match raw {
        Value::Bool(b) => Ok(OrTemplate::Value(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(OrTemplate::Value(i != 0)),
            None => Err(format!("invalid number {} for boolean", n)),
        },
        Value::String(s) => Ok(from_string(s, parse_bool)),
        Value::Tagged(tagged) => transform_bool(tagged.value),
        other => Err(format!("invalid type {} for boolean", value_kind(&other))),
    }
}

/// Strings accept decimal, `0x`, `0o`, `0b` and leading-zero octal.
pub fn transform_uint64(raw: Value) -> Result<UInt64OrTemplate, String> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .map(OrTemplate::Value)
            .ok_or_else(|| format!("invalid number {} for unsigned integer", n)),
        Value::String(s) => Ok(from_string(s, parse_uint)),
        Value::Tagged(tagged) => transform_uint64(tagged.value),
        other => Err(format!(
            "invalid type {} for unsigned integer",
            value_kind(&other)
        )),
    }
}

/// Integers are bytes; strings are sizes such as `64m`.
pub fn transform_size(raw: Value) -> Result<UnitBytesOrTemplate, String> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .map(|b| OrTemplate::Value(UnitBytes(b)))
            .ok_or_else(|| format!("invalid number {} for size", n)),
        Value::String(s) => Ok(from_string(s, |s| ram_in_bytes(s).map(UnitBytes))),
        Value::Tagged(tagged) => transform_size(tagged.value),
        other => Err(format!("invalid type for size {}", value_kind(&other))),
    }
}

/// Integers are nanoseconds; strings are Go durations such as `1m30s`.
pub fn transform_duration(raw: Value) -> Result<DurationOrTemplate, String> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .map(|nanos| OrTemplate::Value(Duration::from_nanos(nanos)))
            .ok_or_else(|| format!("invalid number {} for duration", n)),
        Value::String(s) => Ok(from_string(s, |s| parse_duration(s).map(Duration))),
        Value::Tagged(tagged) => transform_duration(tagged.value),
        other => Err(format!("invalid type for duration {}", value_kind(&other))),
    }
}

fn from_string<T, F>(s: String, parse: F) -> OrTemplate<T>
where
    T: Default,
    F: Fn(&str) -> Option<T>,
{
    if s.trim().is_empty() {
        return OrTemplate::Value(T::default());
    }
    match parse(&s) {
        Some(v) => OrTemplate::Value(v),
        None => OrTemplate::Template(s),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "on" => Some(true),
        "n" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn parse_uint(s: &str) -> Option<u64> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8).ok()
    } else {
        s.parse().ok()
    }
}
