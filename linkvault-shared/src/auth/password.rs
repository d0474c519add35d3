/// Password hashing using Argon2id
///
/// Credentials are hashed through the [`PasswordHasher`] trait so the session
/// service does not depend on a particular algorithm. The production
/// implementation is [`Argon2PasswordHasher`].
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Salt**: 16 random bytes per hash
///
/// Parameters are embedded in the PHC string, so hashes produced with other
/// parameters still verify.
///
/// # Example
///
/// ```
/// use linkvault_shared::auth::password::{Argon2PasswordHasher, PasswordHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2PasswordHasher::default();
/// let hash = hasher.hash("Passw0rd!")?;
///
/// assert!(hasher.verify(&hash, "Passw0rd!")?);
/// assert!(!hasher.verify(&hash, "wrong")?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// One-way hash and verify for credentials
///
/// Implementations must be slow and salted, and safe to call concurrently.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing digest
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Checks a plaintext password against a digest produced by [`hash`](Self::hash)
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only for unreadable digests.
    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError>;
}

/// Argon2id password hasher
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// Creates a hasher with explicit cost parameters
    ///
    /// # Arguments
    ///
    /// * `m_cost` - Memory in KiB
    /// * `t_cost` - Iterations
    /// * `p_cost` - Parallel lanes
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if the parameters are out of range
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(p_cost)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2PasswordHasher {
    /// 64 MB, 3 iterations, 4 lanes
    fn default() -> Self {
        let params = ParamsBuilder::new()
            .m_cost(65536)
            .t_cost(3)
            .p_cost(4)
            .output_len(32)
            .build()
            .unwrap_or_default();

        Self { params }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;
        if parsed_hash.hash.is_none() {
            return Err(PasswordError::InvalidHash("Hash has no output".to_string()));
        }

        // Parameters come from the PHC string, not from `self`.
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::with_params(1024, 1, 1).expect("valid params")
    }

    #[test]
    fn test_default_params_in_phc_string() {
        let hash = Argon2PasswordHasher::default()
            .hash("test_password_123")
            .expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_produces_different_salts() {
        let hasher = fast_hasher();
        let hash1 = hasher.hash("same_password").unwrap();
        let hash2 = hasher.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct_password").unwrap();

        assert!(hasher.verify(&hash, "correct_password").unwrap());
        assert!(!hasher.verify(&hash, "wrong_password").unwrap());
        assert!(!hasher.verify(&hash, "").unwrap());
    }

    #[test]
    fn test_verify_across_parameter_sets() {
        let hash = fast_hasher().hash("Passw0rd!").unwrap();
        let other = Argon2PasswordHasher::with_params(2048, 2, 1).unwrap();

        assert!(other.verify(&hash, "Passw0rd!").unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = fast_hasher();
        assert!(matches!(
            hasher.verify("invalid_hash", "password"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(matches!(
            hasher.verify("$argon2id$invalid", "password"),
            Err(PasswordError::InvalidHash(_))
        ));

        // Parameters and salt but no output
        let hash = hasher.hash("password").unwrap();
        let truncated = &hash[..hash.rfind('$').unwrap()];
        assert!(matches!(
            hasher.verify(truncated, "password"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_unicode_passwords() {
        let hasher = fast_hasher();
        for password in ["with spaces", "unicode-密码-パスワード", "with-special-chars!@#$%"] {
            let hash = hasher.hash(password).unwrap();
            assert!(hasher.verify(&hash, password).unwrap(), "{} should verify", password);
        }
    }

    #[test]
    fn test_with_params_rejects_out_of_range() {
        assert!(Argon2PasswordHasher::with_params(1, 1, 1).is_err());
    }
}
