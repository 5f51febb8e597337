//! Bash-style variable substitution.
//!
//! Recognized forms are `$$` (a literal `$`), `$name` and `${name}`, where a
//! name is a dotted path into the flattened settings. Default values
//! (`${name:-x}`) and custom errors (`${name:?x}`) are rejected.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_yaml::Value;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// The substitution grammar. Exactly one named group matches per occurrence.
pub static PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\$(?i:(?P<escaped>\$)|(?P<named>[_a-z][_a-z0-9]*(?:\.[_a-z0-9]+)*)|\{(?P<braced>[_a-z][._a-z0-9]*(?::?[-?][^}]*)?)\}|(?P<invalid>))",
    )
    .expect("valid substitution pattern")
});

enum Token<'a> {
    Escaped,
    Variable { name: &'a str, suffix: &'a str },
    Invalid,
}

fn token<'a>(caps: &Captures<'a>) -> Token<'a> {
    if caps.name("escaped").is_some() {
        return Token::Escaped;
    }
    if let Some(named) = caps.name("named") {
        return Token::Variable {
            name: named.as_str(),
            suffix: "",
        };
    }
    if let Some(braced) = caps.name("braced") {
        let text = braced.as_str();
        let end = text.find([':', '-', '?']).unwrap_or(text.len());
        return Token::Variable {
            name: &text[..end],
            suffix: &text[end..],
        };
    }
    Token::Invalid
}

/// Substitute every variable of `document` from `environment`.
///
/// The whole document is checked for unsupported syntax before anything is
/// replaced, and the first missing variable aborts the substitution.
pub fn substitute(document: &str, environment: &BTreeMap<String, String>) -> RenderResult<String> {
    check_syntax(document)?;

    let mut out = String::with_capacity(document.len());
    let mut last = 0;
    for caps in PATTERN.captures_iter(document) {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let Some((start, end, expression)) = whole else { continue };
        out.push_str(&document[last..start]);
        match token(&caps) {
            Token::Escaped => out.push('$'),
            Token::Variable { name, .. } => match environment.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(RenderError::MissingVariable {
                        name: name.to_string(),
                        expression: expression.to_string(),
                    })
                }
            },
            Token::Invalid => return Err(RenderError::InvalidTemplate(line_at(document, start))),
        }
        last = end;
    }
    out.push_str(&document[last..]);
    debug!("Substituted {} bytes of compose document", document.len());
    Ok(out)
}

/// Reject default-value, custom-error and malformed expressions.
pub fn check_syntax(document: &str) -> RenderResult<()> {
    for caps in PATTERN.captures_iter(document) {
        match token(&caps) {
            Token::Variable { suffix, .. } if !suffix.is_empty() => {
                let expression = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                let marker = suffix.trim_start_matches(':');
                return Err(if marker.starts_with('?') {
                    RenderError::CustomErrorSyntax(expression.to_string())
                } else {
                    RenderError::DefaultValueSyntax(expression.to_string())
                });
            }
            Token::Invalid => {
                let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
                return Err(RenderError::InvalidTemplate(line_at(document, start)));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Names of every variable referenced by the string values of a document.
pub fn extract_variables(document: &str) -> RenderResult<BTreeSet<String>> {
    let parsed: Value = serde_yaml::from_str(document)?;
    let mut names = BTreeSet::new();
    collect_variables(&parsed, &mut names);
    Ok(names)
}

fn collect_variables(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for caps in PATTERN.captures_iter(s) {
                if let Token::Variable { name, .. } = token(&caps) {
                    names.insert(name.to_string());
                }
            }
        }
        Value::Sequence(items) => items.iter().for_each(|item| collect_variables(item, names)),
        Value::Mapping(mapping) => mapping.values().for_each(|v| collect_variables(v, names)),
        Value::Tagged(tagged) => collect_variables(&tagged.value, names),
        _ => {}
    }
}

fn line_at(document: &str, offset: usize) -> String {
    let start = document[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = document[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(document.len());
    document[start..end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_named_and_braced() {
        let e = env(&[("version", "latest"), ("foo.bar", "baz")]);
        assert_eq!(
            substitute("image: busybox:${version}\ntext: $foo.bar\n", &e).unwrap(),
            "image: busybox:latest\ntext: baz\n"
        );
    }

    #[test]
    fn test_escape_consumes_no_lookup() {
        assert_eq!(substitute("$$", &BTreeMap::new()).unwrap(), "$");
        assert_eq!(substitute("cost: $$5 and $${x}", &BTreeMap::new()).unwrap(), "cost: $5 and ${x}");
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_name() {
        let e = env(&[("name", "world")]);
        assert_eq!(substitute("hello $name.", &e).unwrap(), "hello world.");
    }

    #[test]
    fn test_missing_variable_fails_closed() {
        let err = substitute("a: ${present}\nb: ${missing}\n", &env(&[("present", "x")])).unwrap_err();
        assert!(matches!(err, RenderError::MissingVariable { ref name, .. } if name == "missing"));
        assert_eq!(
            err.to_string(),
            "required variable missing is missing a value (in ${missing})"
        );
    }

    #[test]
    fn test_default_value_syntax_rejected() {
        let e = env(&[("front.port", "4242")]);
        for doc in ["- \"${front.port:-9090}:80\"", "- \"${front.port-9090}:80\""] {
            let err = substitute(doc, &e).unwrap_err();
            assert!(matches!(err, RenderError::DefaultValueSyntax(_)), "{}", doc);
        }
        let err = substitute("${front.port:-9090}", &e).unwrap_err();
        assert!(err.to_string().ends_with("Invalid variable: ${front.port:-9090}"));
    }

    #[test]
    fn test_custom_error_syntax_rejected() {
        let e = env(&[("front.port", "4242")]);
        for doc in ["${front.port:?Error}", "${front.port?Error:unset variable}"] {
            let err = substitute(doc, &e).unwrap_err();
            assert!(matches!(err, RenderError::CustomErrorSyntax(_)), "{}", doc);
        }
    }

    #[test]
    fn test_syntax_checked_before_lookup() {
        let err = substitute("${missing}\n${x:-1}\n", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, RenderError::DefaultValueSyntax(_)));
    }

    #[test]
    fn test_invalid_template() {
        let err = substitute("ok: 1\nbad: $ 1\n", &BTreeMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "invalid template: bad: $ 1");
    }

    #[test]
    fn test_extract_variables() {
        let vars = extract_variables(
            "services:\n  web:\n    image: nginx:${tag}\n    ports: [\"$web.port:80\"]\n    labels:\n      cost: $$5\n",
        )
        .unwrap();
        assert_eq!(
            vars.into_iter().collect::<Vec<_>>(),
            vec!["tag".to_string(), "web.port".to_string()]
        );
    }
}
