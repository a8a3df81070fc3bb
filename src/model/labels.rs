//! Label set canonicalization and fingerprinting.
//!
//! A series is identified by its label set. Replicas are not required to
//! emit labels in any particular order, so equality and map lookups go
//! through a canonical serialization: labels sorted by (name, value), then
//! hashed with xxHash64. The fingerprint is an opaque key; two label sets
//! compare equal iff their canonical forms hash equal.

use crate::model::proto::Label;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Seed for label fingerprints. Changing it invalidates nothing persistent
/// (fingerprints live only for one merge cycle) but keeps hashes stable
/// across processes for debugging.
const FINGERPRINT_SEED: u64 = 0;

/// Separator written between hashed components so that ("ab", "c") and
/// ("a", "bc") produce different fingerprints.
const SEPARATOR: [u8; 1] = [0xfe];

/// Compute the order-insensitive fingerprint of a label set.
pub fn fingerprint(labels: &[Label]) -> u64 {
    let mut sorted: Vec<&Label> = labels.iter().collect();
    sorted.sort();

    let mut hasher = XxHash64::with_seed(FINGERPRINT_SEED);
    for label in sorted {
        hasher.write(label.name.as_bytes());
        hasher.write(&SEPARATOR);
        hasher.write(label.value.as_bytes());
        hasher.write(&SEPARATOR);
    }
    hasher.finish()
}

/// Render a label set for log output, in `{name="value", ...}` form.
pub fn format_labels(labels: &[Label]) -> String {
    let mut out = String::from("{");
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&label.name);
        out.push_str("=\"");
        out.push_str(&label.value);
        out.push('"');
    }
    out.push('}');
    out
}
