//! Server settings tree helpers
//!
//! Effective server settings are a defaults tree overlaid with per-server
//! overrides. Overrides are persisted one row per leaf, keyed by a slash path
//! (`/server/role`) with a YAML-encoded value. Both backends share these
//! helpers so partial updates behave identically.

use serde_json::{Map, Value};

use miq_bootstrap_common::{settings_key, settings_path};

/// Recursively merge `patch` into `base`.
///
/// Objects merge key by key; any other patch value replaces the base value.
/// Keys absent from `patch` are left untouched.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, patch_value),
                    None => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Look up a dotted path (`server.role`)
pub fn lookup<'a>(settings: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(settings, |node, segment| node.as_object()?.get(segment))
}

/// Build a nested patch holding `value` at a dotted path
pub fn nest(dotted: &str, value: Value) -> Value {
    dotted
        .rsplit('.')
        .fold(value, |inner, segment| {
            let mut map = Map::new();
            map.insert(segment.to_string(), inner);
            Value::Object(map)
        })
}

/// Flatten a patch into `(key, value)` leaf changes, keys in `/a/b` form
pub fn leaf_changes(patch: &Value) -> Vec<(String, Value)> {
    fn walk(prefix: &str, node: &Value, out: &mut Vec<(String, Value)>) {
        match node {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    walk(&path, child, out);
                }
            }
            leaf => out.push((settings_key(prefix), leaf.clone())),
        }
    }

    let mut out = Vec::new();
    if let Value::Object(map) = patch {
        for (key, child) in map {
            walk(key, child, &mut out);
        }
    }
    out
}

/// Set a value at a slash key, creating intermediate objects as needed
pub fn insert_at(settings: &mut Value, key: &str, value: Value) {
    let segments = settings_path(key);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = settings;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert(Value::Null);
    }
    ensure_object(node).insert(last.to_string(), value);
}

/// Scalars in the way of a nested write are replaced by an empty object
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just made an object"),
    }
}

/// Remove the value at a slash key, pruning parents left empty
pub fn remove_at(settings: &mut Value, key: &str) -> Option<Value> {
    fn remove(node: &mut Value, segments: &[&str]) -> Option<Value> {
        let map = node.as_object_mut()?;
        match segments {
            [] => None,
            [last] => map.remove(*last),
            [head, rest @ ..] => {
                let child = map.get_mut(*head)?;
                let removed = remove(child, rest);
                if child.as_object().is_some_and(Map::is_empty) {
                    map.remove(*head);
                }
                removed
            }
        }
    }

    remove(settings, &settings_path(key))
}

/// Look up the value at a slash key
pub fn value_at<'a>(settings: &'a Value, key: &str) -> Option<&'a Value> {
    settings_path(key)
        .into_iter()
        .try_fold(settings, |node, segment| node.as_object()?.get(segment))
}

/// Compose effective settings from defaults and persisted leaf overrides
pub fn effective_settings<I>(defaults: &Value, changes: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut settings = if defaults.is_object() {
        defaults.clone()
    } else {
        Value::Object(Map::new())
    };
    for (key, value) in changes {
        insert_at(&mut settings, &key, value);
    }
    settings
}

/// Encode a leaf value the way settings change rows store it
pub fn encode_value(value: &Value) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Decode a settings change row value
pub fn decode_value(raw: &str) -> anyhow::Result<Value> {
    Ok(serde_yaml::from_str(raw)?)
}
