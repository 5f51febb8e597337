use serde_yaml::Value;

use appdef_settings::scalar_to_string;

use super::Rule;

/// Every declared secret must be `external`.
#[derive(Debug, Default, Clone)]
pub struct ExternalSecretsRule;

impl ExternalSecretsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for ExternalSecretsRule {
    fn collect(&mut self, _parent: &str, _key: &str, _value: &Value) {}

    fn accept(&self, _parent: &str, key: &str) -> bool {
        key == "secrets"
    }

    fn validate(&self, _parent: &str, _key: &str, value: &Value) -> Vec<String> {
        let Value::Mapping(secrets) = value else {
            return Vec::new();
        };
        secrets
            .iter()
            .filter_map(|(name, secret)| match secret {
                Value::Mapping(fields) if !fields.contains_key("external") => Some(format!(
                    "secret {:?} should be external",
                    scalar_to_string(name)
                )),
                _ => None,
            })
            .collect()
    }
}
