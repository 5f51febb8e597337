//! The two-phase rule engine.

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use appdef_settings::scalar_to_string;

use crate::error::{ValidationError, ValidatorError, ValidatorResult};
use crate::rules::{ExternalSecretsRule, RelativePathRule, Rule};

/// Runs a set of [`Rule`]s over a parsed Compose document.
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

impl Validator {
    /// Create a validator without rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with the relative-path and external-secrets rules.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_relative_path_rule()
            .with_external_secrets_rule()
    }

    pub fn with_relative_path_rule(self) -> Self {
        self.with_rule(Box::new(RelativePathRule::new()))
    }

    pub fn with_external_secrets_rule(self) -> Self {
        self.with_rule(Box::new(ExternalSecretsRule::new()))
    }

    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Read, parse and validate a Compose file.
    pub fn validate_file(&mut self, path: impl AsRef<Path>) -> ValidatorResult<()> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ValidatorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_yaml::from_str(&raw).map_err(ValidatorError::Parse)?;
        self.validate(&document)
    }

    /// Validate a parsed document.
    ///
    /// Every rule collects over the whole document before the first rule
    /// validates anything.
    pub fn validate(&mut self, document: &Value) -> ValidatorResult<()> {
        visit_all("", document, &mut |parent, key, value| {
            for rule in self.rules.iter_mut() {
                rule.collect(parent, key, value);
            }
        });

        let mut errors = Vec::new();
        visit_all("", document, &mut |parent, key, value| {
            for rule in &self.rules {
                if rule.accept(parent, key) {
                    errors.extend(rule.validate(parent, key, value));
                }
            }
        });

        debug!("Validation found {} problems", errors.len());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors }.into())
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Call `visit` on every non-string value of every mapping, depth first,
/// with the dotted path of the enclosing mapping.
fn visit_all<F>(parent: &str, node: &Value, visit: &mut F)
where
    F: FnMut(&str, &str, &Value),
{
    let Value::Mapping(mapping) = node else {
        return;
    };
    for (key, value) in mapping {
        if value.is_string() {
            continue;
        }
        let key = scalar_to_string(key);
        visit(parent, &key, value);
        if value.is_mapping() {
            let path = if parent.is_empty() {
                key
            } else {
                format!("{}.{}", parent, key)
            };
            visit_all(&path, value, visit);
        }
    }
}
