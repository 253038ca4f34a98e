//! Canonical JSON encoding used for every content hash in sheaf.

use serde_json::Value;

/// Encode `value` compactly with object keys in byte order at every depth.
/// Array order is kept.
pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    encode(value, &mut out);
    out
}

fn encode(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                encode_leaf(&Value::from(key.as_str()), out);
                out.push(b':');
                encode(item, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                encode(item, out);
            }
            out.push(b']');
        }
        leaf => encode_leaf(leaf, out),
    }
}

// `Display` on a leaf value is compact JSON with proper string escaping.
fn encode_leaf(leaf: &Value, out: &mut Vec<u8>) {
    out.extend_from_slice(leaf.to_string().as_bytes());
}
