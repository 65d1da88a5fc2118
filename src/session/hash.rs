//! `ListHashUtil` (§4.8): a cheap fingerprint for detecting in-place
//! modifications of very large lists without a full linear scan.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

fn hash_item(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    // `Value` doesn't implement `Hash`; its canonical string form does, and
    // is stable for equal values.
    value.to_string().hash(&mut hasher);
    hasher.finish()
}

fn sample_indices(n: usize) -> Vec<usize> {
    if n <= 5 {
        return (0..n).collect();
    }
    let mut idx = vec![0, n / 4, n / 2, 3 * n / 4, n - 1];
    idx.dedup();
    idx
}

/// `"size:<n>;<i>:<hash(items[i])>,…"` over a sample of indices, itself
/// hashed and hex-encoded.
pub fn compute_list_hash(items: &[Value]) -> String {
    let n = items.len();
    let mut descriptor = format!("size:{n};");
    for (pos, &i) in sample_indices(n).iter().enumerate() {
        if pos > 0 {
            descriptor.push(',');
        }
        descriptor.push_str(&format!("{i}:{:x}", hash_item(&items[i])));
    }
    let mut hasher = DefaultHasher::new();
    descriptor.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
