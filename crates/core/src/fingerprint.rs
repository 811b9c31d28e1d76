// crates/core/src/fingerprint.rs
//! Error fingerprinting for the Rate Limiter: a stable hash of a request
//! path, method, error class, and the head of its message.

use sha2::{Digest, Sha256};

/// Computes a stable fingerprint from `(path, method, err_class, err_head)`,
/// truncating the error message to its first 100 bytes before hashing so
/// that two errors differing only deep in a long message still collapse
/// to the same key.
pub fn error_fingerprint(path: &str, method: &str, err_class: &str, err_message: &str) -> String {
    let head: String = err_message.chars().take(100).collect();
    let mut hasher = Sha256::new();
    for part in [path, method, err_class, head.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_produce_identical_fingerprints() {
        let a = error_fingerprint("/api/projects", "GET", "DbError", "connection refused");
        let b = error_fingerprint("/api/projects", "GET", "DbError", "connection refused");
        assert_eq!(a, b);
    }

    #[test]
    fn differing_path_changes_the_fingerprint() {
        let a = error_fingerprint("/api/projects", "GET", "DbError", "connection refused");
        let b = error_fingerprint("/api/elements", "GET", "DbError", "connection refused");
        assert_ne!(a, b);
    }

    #[test]
    fn message_is_truncated_before_hashing() {
        let long_tail_a = format!("{}{}", "x".repeat(100), "AAAA");
        let long_tail_b = format!("{}{}", "x".repeat(100), "BBBB");
        let a = error_fingerprint("/api/projects", "GET", "DbError", &long_tail_a);
        let b = error_fingerprint("/api/projects", "GET", "DbError", &long_tail_b);
        assert_eq!(a, b, "bytes past the 100-char head must not affect the fingerprint");
    }
}
