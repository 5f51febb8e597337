//! Validation rules.

mod external_secrets;
mod relative_path;

pub use external_secrets::ExternalSecretsRule;
pub use relative_path::RelativePathRule;

use serde_yaml::Value;

/// A check run over every non-string node of a Compose document.
///
/// `collect` sees every node before any `validate` call, so a rule can
/// gather the declarations it needs. `validate` is only called on nodes the
/// rule accepts.
#[cfg_attr(test, mockall::automock)]
pub trait Rule {
    fn collect(&mut self, parent: &str, key: &str, value: &Value);

    fn accept(&self, parent: &str, key: &str) -> bool;

    fn validate(&self, parent: &str, key: &str, value: &Value) -> Vec<String>;
}
