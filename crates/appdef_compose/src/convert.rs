//! Post-processing of the serialized model.
//!
//! The typed model writes every [`OrTemplate`](crate::OrTemplate) field under a
//! `template_` prefixed key holding `{value: ..}` or `{valuetemplate: ..}`.
//! [`convert_templates`] turns that into Helm template syntax, while
//! [`resolve_templates`] unwraps concrete values and rejects any expression
//! left behind.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};

use appdef_settings::value_kind;

use crate::error::{ComposeError, ComposeResult};
use crate::or_template::{TEMPLATE_KEY, VALUE_KEY};
use crate::types::Config;

/// Prefix of keys whose value is a deferred template wrapper.
pub const TEMPLATE_PREFIX: &str = "template_";

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\$\$|\$\{([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)(?::?[-?][^}]*)?\}|\$([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)",
    )
    .expect("valid variable pattern")
});

static QUOTED_TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(\{\{[^'}]*\}\})'|"(\{\{[^"}]*\}\})""#).expect("valid quoted template pattern")
});

impl Config {
    /// Serialize with every expression rewritten to Helm template syntax.
    pub fn to_template_value(&self) -> ComposeResult<Value> {
        convert_templates(serde_yaml::to_value(self).map_err(ComposeError::Serialize)?)
    }

    /// Serialize with every field holding its concrete value.
    pub fn to_resolved_value(&self) -> ComposeResult<Value> {
        resolve_templates(serde_yaml::to_value(self).map_err(ComposeError::Serialize)?)
    }
}

/// Apply `f` to every node of the tree, children first.
pub fn map_values<F>(value: Value, f: &mut F) -> ComposeResult<Value>
where
    F: FnMut(Value) -> ComposeResult<Value>,
{
    let value = match value {
        Value::Mapping(mapping) => {
            let mut out = Mapping::with_capacity(mapping.len());
            for (key, child) in mapping {
                out.insert(key, map_values(child, f)?);
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| map_values(item, f))
                .collect::<ComposeResult<Vec<_>>>()?,
        ),
        other => other,
    };
    f(value)
}

/// Rewrite `$name` and `${name}` into `{{.Values.name}}` and unwrap every
/// `template_` key.
pub fn convert_templates(value: Value) -> ComposeResult<Value> {
    map_values(value, &mut |node| match node {
        Value::String(s) => Ok(Value::String(to_go_template(&s))),
        Value::Mapping(mapping) => unwrap_template_keys(mapping, false).map(Value::Mapping),
        other => Ok(other),
    })
}

/// Unwrap every `template_` key to its concrete value.
///
/// Fails on the first wrapper still holding an expression, which means a
/// field never received a value it could be parsed as.
pub fn resolve_templates(value: Value) -> ComposeResult<Value> {
    map_values(value, &mut |node| match node {
        Value::Mapping(mapping) => unwrap_template_keys(mapping, true).map(Value::Mapping),
        other => Ok(other),
    })
}

fn unwrap_template_keys(mapping: Mapping, strict: bool) -> ComposeResult<Mapping> {
    let mut out = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        let field = match key.as_str().and_then(|k| k.strip_prefix(TEMPLATE_PREFIX)) {
            Some(field) => field.to_string(),
            None => {
                out.insert(key, value);
                continue;
            }
        };
        let wrapper = match value {
            Value::Mapping(wrapper) => wrapper,
            other => return Err(ComposeError::ExpectedMap(value_kind(&other))),
        };
        let unwrapped = match wrapper.get(TEMPLATE_KEY) {
            Some(expression) if strict => {
                return Err(ComposeError::Unresolved {
                    field,
                    expression: appdef_settings::scalar_to_string(expression),
                })
            }
            Some(expression) => expression.clone(),
            None => wrapper.get(VALUE_KEY).cloned().unwrap_or(Value::Null),
        };
        out.insert(Value::String(field), unwrapped);
    }
    Ok(out)
}

/// Convert `$foo` and `${foo}` into `{{.Values.foo}}`.
///
/// Default and error suffixes (`${foo:-bar}`, `${foo?err}`) are dropped and
/// `$$` becomes a literal `$`.
pub fn to_go_template(template: &str) -> String {
    VARIABLE_PATTERN
        .replace_all(template, |caps: &Captures| {
            match caps.get(1).or_else(|| caps.get(2)) {
                Some(name) => format!("{{{{.Values.{}}}}}", name.as_str()),
                None => "$".to_string(),
            }
        })
        .into_owned()
}

/// Remove YAML quotes around values that are a single `{{...}}` expression.
pub fn unquote(template: &str) -> String {
    QUOTED_TEMPLATE
        .replace_all(template, |caps: &Captures| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_go_template() {
        assert_eq!(
            to_go_template("$VAR ${HELLO} ${WORLD:-world} ${FOOBAR?errbaz} $$"),
            "{{.Values.VAR}} {{.Values.HELLO}} {{.Values.WORLD}} {{.Values.FOOBAR}} $"
        );
        assert_eq!(to_go_template("${app.name}-$$HOME"), "{{.Values.app.name}}-$HOME");
        assert_eq!(to_go_template("no variables"), "no variables");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("replicas: '{{.Values.n}}'"), "replicas: {{.Values.n}}");
        assert_eq!(unquote("port: \"{{.Values.p}}\""), "port: {{.Values.p}}");
        assert_eq!(
            unquote("image: 'nginx:{{.Values.tag}}'"),
            "image: 'nginx:{{.Values.tag}}'"
        );
    }

    #[test]
    fn test_convert_templates() {
        let tree: Value = serde_yaml::from_str(
            "image: busybox:${version}\n\
             template_privileged:\n  valuetemplate: ${debug}\n\
             template_tty:\n  value: true\n\
             command: [echo, $$HOME]\n",
        )
        .unwrap();
        let converted = convert_templates(tree).unwrap();

        assert_eq!(converted["image"].as_str(), Some("busybox:{{.Values.version}}"));
        assert_eq!(converted["privileged"].as_str(), Some("{{.Values.debug}}"));
        assert_eq!(converted["tty"].as_bool(), Some(true));
        assert_eq!(converted["command"][1].as_str(), Some("$HOME"));
        assert!(converted.get("template_tty").is_none());
    }

    #[test]
    fn test_convert_rejects_non_map_wrapper() {
        let tree: Value = serde_yaml::from_str("template_tty: true\n").unwrap();
        let err = convert_templates(tree).unwrap_err();
        assert_eq!(err.to_string(), "Expected a map, got bool");
    }

    #[test]
    fn test_resolve_templates() {
        let tree: Value =
            serde_yaml::from_str("template_replicas:\n  value: 3\nimage: ${keep}\n").unwrap();
        let resolved = resolve_templates(tree).unwrap();
        assert_eq!(resolved["replicas"].as_u64(), Some(3));
        assert_eq!(resolved["image"].as_str(), Some("${keep}"));

        let tree: Value =
            serde_yaml::from_str("template_replicas:\n  valuetemplate: lots\n").unwrap();
        let err = resolve_templates(tree).unwrap_err();
        assert_eq!(err.to_string(), "unresolved template for replicas: lots");
    }
}
