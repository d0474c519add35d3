/// Refresh token digests
///
/// Refresh tokens are stored as SHA-256 digests so a leaked table does not
/// leak usable credentials. The digest is deterministic, which keeps the
/// lookup a plain equality match on the indexed `token_hash` column.
///
/// # Example
///
/// ```
/// use linkvault_shared::auth::token_hash::TokenHasher;
///
/// let hasher = TokenHasher;
/// let digest = hasher.digest("opaque-refresh-token");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, hasher.digest("opaque-refresh-token"));
/// ```

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LENGTH: usize = 64;

/// SHA-256 token hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenHasher;

impl TokenHasher {
    /// Hashes a token plaintext into a lowercase hex digest
    pub fn digest(&self, plaintext: &str) -> String {
        hex::encode(Sha256::digest(plaintext.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            TokenHasher.digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_fixed_length_hex() {
        let digest = TokenHasher.digest("some token value");
        assert_eq!(digest.len(), DIGEST_HEX_LENGTH);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_different_inputs_differ() {
        assert_ne!(TokenHasher.digest("token-a"), TokenHasher.digest("token-b"));
    }
}
