//! Conversion between nested settings and the flat `dotted.key -> string`
//! environment used for variable substitution.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::{SettingsError, SettingsResult};
use crate::settings::{value_kind, Settings};

impl Settings {
    /// Flatten into a one-level map with keys joined by dots.
    ///
    /// Sequence elements use their index as the path segment (`list.0`).
    /// Null values flatten to an empty string.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for (key, value) in self.as_mapping() {
            if let Some(key) = key.as_str() {
                flatten_value(key, value, &mut out);
            }
        }
        out
    }

    /// Rebuild settings from a flattened map.
    ///
    /// Each value is decoded as a YAML scalar so that `"3"` becomes a number
    /// and `"true"` a boolean. Values that do not decode to a scalar are kept
    /// as plain strings. Sequence indexes must be contiguous from zero.
    pub fn from_flatten(flat: &BTreeMap<String, String>) -> SettingsResult<Settings> {
        let mut entries: Vec<(Vec<&str>, &String)> = flat
            .iter()
            .map(|(key, raw)| (key.split('.').collect(), raw))
            .collect();
        entries.sort_by(|(a, _), (b, _)| compare_paths(a, b));

        let mut root = Mapping::new();
        for (keys, raw) in entries {
            assign_key(&mut root, &keys, guess_scalar(raw))?;
        }
        Settings::from_mapping(root)
    }

    /// Dotted paths of every null value, sequence elements as `key[i]`.
    pub fn nil_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        nil_keys_in_mapping(self.as_mapping(), "", &mut keys);
        keys.sort();
        keys
    }
}

/// Render a scalar the way it appears in the substitution environment.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn flatten_value(path: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                if let Some(key) = key.as_str() {
                    flatten_value(&format!("{}.{}", path, key), child, out);
                }
            }
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_value(&format!("{}.{}", path, index), child, out);
            }
        }
        scalar => {
            out.insert(path.to_string(), scalar_to_string(scalar));
        }
    }
}

fn guess_scalar(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Mapping(_)) | Ok(Value::Sequence(_)) | Ok(Value::Tagged(_)) | Err(_) => {
            Value::String(raw.to_string())
        }
        Ok(scalar) => scalar,
    }
}

/// Numeric segments compare by value so `list.2` comes before `list.10`.
fn compare_paths(a: &[&str], b: &[&str]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let order = match (x.parse::<usize>(), y.parse::<usize>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => x.cmp(y),
        };
        if order != Ordering::Equal {
            return order;
        }
    }
    a.len().cmp(&b.len())
}

fn sequence_index(rest: &[&str]) -> Option<usize> {
    if rest.len() != 1 {
        return None;
    }
    rest[0].parse::<usize>().ok()
}

fn assign_key(mapping: &mut Mapping, keys: &[&str], value: Value) -> SettingsResult<()> {
    let key = Value::String(keys[0].to_string());
    let rest = &keys[1..];

    if rest.is_empty() {
        if let Some(existing) = mapping.get(&key) {
            if std::mem::discriminant(existing) != std::mem::discriminant(&value) {
                return Err(SettingsError::TypeConflict {
                    key: keys[0].to_string(),
                    existing: value_kind(existing),
                    incoming: value_kind(&value),
                });
            }
        }
        mapping.insert(key, value);
        return Ok(());
    }

    if let Some(index) = sequence_index(rest) {
        let entry = mapping
            .entry(key)
            .or_insert_with(|| Value::Sequence(Vec::new()));
        let items = match entry {
            Value::Sequence(items) => items,
            other => {
                return Err(SettingsError::NotASequence {
                    key: keys[0].to_string(),
                    found: value_kind(other),
                })
            }
        };
        match index.cmp(&items.len()) {
            Ordering::Less => items[index] = value,
            Ordering::Equal => items.push(value),
            Ordering::Greater => {
                return Err(SettingsError::IndexOutOfRange {
                    key: keys[0].to_string(),
                    index: rest[0].to_string(),
                    len: items.len(),
                })
            }
        }
        return Ok(());
    }

    let entry = mapping
        .entry(key)
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    match entry {
        Value::Mapping(inner) => assign_key(inner, rest, value),
        other => Err(SettingsError::NotAMap {
            key: keys[0].to_string(),
            found: value_kind(other),
        }),
    }
}

fn nil_keys_in_mapping(mapping: &Mapping, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in mapping {
        let Some(key) = key.as_str() else { continue };
        let path = format!("{}{}", prefix, key);
        nil_keys_in_value(value, &path, out);
    }
}

fn nil_keys_in_value(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::Null => out.push(path.to_string()),
        Value::Mapping(inner) => nil_keys_in_mapping(inner, &format!("{}.", path), out),
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                nil_keys_in_value(item, &format!("{}[{}]", path, index), out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{load, LoadOptions};

    fn settings(yaml: &str) -> Settings {
        load(yaml.as_bytes(), &LoadOptions::new()).unwrap()
    }

    fn flat(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_flatten_nested() {
        let s = settings(
            "foo: bar\nbar:\n  baz: banana\n  port: 80\n  enabled: true\nlist: [a, b]\nempty:\n",
        );
        assert_eq!(
            s.flatten(),
            flat(&[
                ("foo", "bar"),
                ("bar.baz", "banana"),
                ("bar.port", "80"),
                ("bar.enabled", "true"),
                ("list.0", "a"),
                ("list.1", "b"),
                ("empty", ""),
            ])
        );
    }

    #[test]
    fn test_flatten_sequence_of_mappings() {
        let s = settings("hosts:\n  - name: a\n  - name: b\n");
        let f = s.flatten();
        assert_eq!(f.get("hosts.0.name").map(String::as_str), Some("a"));
        assert_eq!(f.get("hosts.1.name").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_flatten_matches_nested_lookup() {
        let s = settings("a:\n  b:\n    c: deep\n  n: 3\n");
        let f = s.flatten();
        for path in ["a.b.c", "a.n"] {
            assert_eq!(
                f.get(path).cloned(),
                s.get(path).map(scalar_to_string),
                "mismatch for {}",
                path
            );
        }
    }

    #[test]
    fn test_from_flatten_guesses_types() {
        let s = Settings::from_flatten(&flat(&[
            ("front.deploy.replicas", "9"),
            ("front.debug", "true"),
            ("front.name", "web"),
            ("tags.0", "x"),
            ("tags.1", "y"),
        ]))
        .unwrap();
        assert_eq!(s.get("front.deploy.replicas").and_then(Value::as_u64), Some(9));
        assert_eq!(s.get("front.debug").and_then(Value::as_bool), Some(true));
        assert_eq!(s.get("front.name").and_then(Value::as_str), Some("web"));
        assert_eq!(s.get("tags.1").and_then(Value::as_str), Some("y"));
    }

    #[test]
    fn test_from_flatten_keeps_structured_text_as_string() {
        let s = Settings::from_flatten(&flat(&[("msg", "a: b")])).unwrap();
        assert_eq!(s.get("msg").and_then(Value::as_str), Some("a: b"));
    }

    #[test]
    fn test_from_flatten_conflict() {
        let err = Settings::from_flatten(&flat(&[("a", "1"), ("a.b", "2")])).unwrap_err();
        assert!(matches!(err, SettingsError::NotAMap { .. }));
        assert!(err.to_string().contains("key a already present and not a map"));
    }

    #[test]
    fn test_from_flatten_orders_indexes_numerically() {
        let pairs: Vec<(String, String)> = (0..12)
            .map(|i| (format!("list.{}", i), format!("v{}", i)))
            .collect();
        let flat: BTreeMap<String, String> = pairs.into_iter().collect();
        let s = Settings::from_flatten(&flat).unwrap();
        let list = s.get("list").and_then(Value::as_sequence).unwrap();
        assert_eq!(list.len(), 12);
        assert_eq!(list[2].as_str(), Some("v2"));
        assert_eq!(list[10].as_str(), Some("v10"));
    }

    #[test]
    fn test_from_flatten_rejects_index_gap() {
        for key in ["list.18446744073709551615", "list.100000000000", "list.1"] {
            let err = Settings::from_flatten(&flat(&[(key, "x")])).unwrap_err();
            assert!(
                matches!(err, SettingsError::IndexOutOfRange { ref key, len: 0, .. } if key == "list"),
                "{}",
                key
            );
        }
        let err = Settings::from_flatten(&flat(&[("l.0", "a"), ("l.5", "b")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "index 5 of key l is out of range, the sequence has 1 elements"
        );
    }

    #[test]
    fn test_nil_keys() {
        let s = settings("a:\nb:\n  c:\n  d: 1\nl:\n  - x\n  -\n");
        assert_eq!(s.nil_keys(), vec!["a", "b.c", "l[1]"]);
    }
}
