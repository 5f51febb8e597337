//! The `x-enabled` service extension.

use serde_yaml::Value;
use tracing::debug;

use appdef_compose::Config;
use appdef_settings::value_kind;

use crate::error::{RenderError, RenderResult};

/// Extension key that switches a service on or off.
pub const ENABLED_KEY: &str = "x-enabled";

/// Evaluate an `x-enabled` value.
///
/// `""`, `0` and `false` are false, `1` and `true` are true, and a leading
/// `!` negates the rest. Numbers are read as their text.
pub fn is_enabled(value: &Value) -> RenderResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => parse_enabled(s),
        Value::Number(n) => parse_enabled(&n.to_string()),
        Value::Tagged(tagged) => is_enabled(&tagged.value),
        other => Err(RenderError::InvalidEnabledType(value_kind(other))),
    }
}

fn parse_enabled(raw: &str) -> RenderResult<bool> {
    let v = raw.trim().to_lowercase();
    match v.as_str() {
        "1" | "true" => Ok(true),
        "" | "0" | "false" => Ok(false),
        _ => match v.strip_prefix('!') {
            Some(rest) => parse_enabled(rest).map(|enabled| !enabled),
            None => Err(RenderError::InvalidEnabled(raw.to_string())),
        },
    }
}

/// Drop every service whose `x-enabled` evaluates to false.
pub fn remove_disabled_services(config: &mut Config) -> RenderResult<()> {
    let mut disabled = Vec::new();
    for (name, service) in &config.services {
        if let Some(flag) = service.extra(ENABLED_KEY) {
            if !is_enabled(flag)? {
                disabled.push(name.clone());
            }
        }
    }
    for name in disabled {
        debug!("Service {} is disabled", name);
        config.services.remove(&name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn test_truth_values() {
        assert!(is_enabled(&Value::Bool(true)).unwrap());
        assert!(is_enabled(&s(" TRUE ")).unwrap());
        assert!(is_enabled(&s("1")).unwrap());
        assert!(!is_enabled(&s("")).unwrap());
        assert!(!is_enabled(&s("False")).unwrap());
        assert!(!is_enabled(&Value::Number(0.into())).unwrap());
    }

    #[test]
    fn test_negation() {
        assert!(!is_enabled(&s("! true")).unwrap());
        assert!(is_enabled(&s("!0")).unwrap());
        assert!(is_enabled(&s("!!1")).unwrap());
    }

    #[test]
    fn test_invalid_values() {
        let err = is_enabled(&s("maybe")).unwrap_err();
        assert_eq!(err.to_string(), "maybe is not a valid value for x-enabled");
        let err = is_enabled(&Value::Sequence(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "invalid type (sequence) for x-enabled");
    }
}
