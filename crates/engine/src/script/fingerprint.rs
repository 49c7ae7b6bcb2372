use std::hash::{Hash, Hasher};

/// Cache key for a compiled script.
pub fn fingerprint(source: &[u8]) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}
