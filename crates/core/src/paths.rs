//! Dotted-path access over `serde_json::Value`.
//!
//! The grammar is deliberately small: dot-separated object keys with an
//! optional single `[index]` on a segment, e.g. `attributes.tags[0]`.

use serde_json::Value;

/// Extract a value at a dotted path. Returns `None` when any segment is
/// missing or the shape doesn't match.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        if seg.is_empty() {
            return None;
        }
        let (key, idx_opt) = split_index(seg)?;
        match cur {
            Value::Object(map) => {
                cur = map.get(key)?;
            }
            _ => return None,
        }
        if let Some(i) = idx_opt {
            match cur {
                Value::Array(arr) => {
                    cur = arr.get(i)?;
                }
                _ => return None,
            }
        }
    }
    Some(cur)
}

/// Assign a value at a dotted path, creating intermediate objects as
/// needed. Index segments are not supported on the write side; request
/// payloads are plain nested objects.
pub fn set(root: &mut Value, path: &str, value: Value) {
    if !root.is_object() {
        *root = Value::Object(serde_json::Map::new());
    }
    let mut cur = root;
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return;
    }
    for seg in &segments[..segments.len() - 1] {
        let Some(map) = cur.as_object_mut() else { return };
        let next = map
            .entry((*seg).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !next.is_object() {
            *next = Value::Object(serde_json::Map::new());
        }
        cur = next;
    }
    if let Some(map) = cur.as_object_mut() {
        map.insert(segments[segments.len() - 1].to_string(), value);
    }
}

fn split_index(seg: &str) -> Option<(&str, Option<usize>)> {
    match seg.find('[') {
        Some(brk) => {
            let end = seg.get(brk + 1..)?.find(']')? + brk + 1;
            let key = &seg[..brk];
            let idx: usize = seg[brk + 1..end].parse().ok()?;
            Some((key, Some(idx)))
        }
        None => Some((seg, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_extracts_nested_scalars() {
        let v = json!({"attributes": {"name": "steel", "tags": ["a", "b"]}});
        assert_eq!(get(&v, "attributes.name"), Some(&json!("steel")));
        assert_eq!(get(&v, "attributes.tags[1]"), Some(&json!("b")));
        assert_eq!(get(&v, "attributes.missing"), None);
        assert_eq!(get(&v, "attributes.tags[9]"), None);
        assert_eq!(get(&v, "attributes.name[0]"), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut out = json!({});
        set(&mut out, "attributes.name", json!("steel"));
        set(&mut out, "attributes.grade", json!(3));
        set(&mut out, "label", json!(null));
        assert_eq!(
            out,
            json!({"attributes": {"name": "steel", "grade": 3}, "label": null})
        );
    }

    #[test]
    fn set_overwrites_non_object_intermediates() {
        let mut out = json!({"a": 1});
        set(&mut out, "a.b", json!(2));
        assert_eq!(out, json!({"a": {"b": 2}}));
    }
}
