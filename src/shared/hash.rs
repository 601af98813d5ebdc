use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Deterministic 64-bit hash used to key evaluation requests.
pub fn stable_hash64<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
