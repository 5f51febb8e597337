//! Inline `KEY=VALUE` overrides.

use std::collections::BTreeMap;

use crate::error::{SettingsError, SettingsResult};

/// Parse `KEY=VALUE` pairs into a flat map.
///
/// The value is everything after the first `=`. A key given twice is an error.
pub fn parse_overrides<S: AsRef<str>>(pairs: &[S]) -> SettingsResult<BTreeMap<String, String>> {
    let mut overrides = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| SettingsError::MissingEquals(pair.to_string()))?;
        if overrides.contains_key(key) {
            return Err(SettingsError::DuplicateOverride(key.to_string()));
        }
        overrides.insert(key.to_string(), value.to_string());
    }
    Ok(overrides)
}
