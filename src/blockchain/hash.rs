use sha2::{Digest, Sha256};

/// Derive the content hash of a block from its logical fields and nonce.
///
/// Pure and deterministic. Any change to an input yields a different hash,
/// so callers must treat a previously computed hash as stale once a field
/// changes.
pub fn compute_hash(
    position: u64,
    previous_hash: &str,
    payload: &str,
    timestamp: i64,
    nonce: u64,
) -> String {
    let preimage = format!("{position}:{timestamp}:{previous_hash}:{nonce}:{payload}");
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when the first `difficulty` hex characters of `hash` are all `'0'`.
///
/// A hash shorter than the difficulty never qualifies, which makes any
/// difficulty above 64 unreachable.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|c| c == b'0')
}

#[cfg(test)]
mod tests {
    use super::{compute_hash, meets_difficulty};

    #[test]
    fn hash_is_deterministic() {
        let a = compute_hash(3, "abc", "payload", 1_700_000_000_000, 42);
        let b = compute_hash(3, "abc", "payload", 1_700_000_000_000, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn every_field_feeds_the_hash() {
        let base = compute_hash(1, "prev", "data", 10, 7);
        assert_ne!(base, compute_hash(2, "prev", "data", 10, 7));
        assert_ne!(base, compute_hash(1, "other", "data", 10, 7));
        assert_ne!(base, compute_hash(1, "prev", "datum", 10, 7));
        assert_ne!(base, compute_hash(1, "prev", "data", 11, 7));
        assert_ne!(base, compute_hash(1, "prev", "data", 10, 8));
    }

    #[test]
    fn difficulty_predicate() {
        assert!(meets_difficulty("00ab", 0));
        assert!(meets_difficulty("00ab", 2));
        assert!(!meets_difficulty("00ab", 3));
        assert!(!meets_difficulty("0", 2));
        assert!(meets_difficulty("", 0));
    }
}
