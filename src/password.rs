//! Password hashing and verification for the login path.
//!
//! No retries and no lockout counting here; rate limiting belongs to the
//! surrounding request layer.

use bcrypt::{DEFAULT_COST, hash, verify};

/// Hash a plaintext password for storage.
pub fn hash_password(plaintext: &str) -> anyhow::Result<String> {
    Ok(hash(plaintext, DEFAULT_COST)?)
}

/// Check a plaintext password against a stored salted hash.
///
/// A malformed stored hash reads as "no match" rather than an error, so the
/// caller reports the same uniform failure either way.
#[must_use]
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    verify(plaintext, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn verify_accepts_matching_password() {
        let stored = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &stored));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let stored = hash_password("hunter2").unwrap();
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn malformed_stored_hash_reads_as_no_match() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
        assert!(!verify_password("hunter2", ""));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
    }
}
