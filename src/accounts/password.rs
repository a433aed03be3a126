//! One-way password hashing.

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct HashError(String);

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashError>;

    /// Any error while checking is reported as a mismatch.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, HashError> {
        bcrypt::hash(plain, self.cost).map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        bcrypt::verify(plain, hash).unwrap_or(false)
    }
}

/// Hash on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(
    hasher: Arc<dyn PasswordHasher>,
    plain: String,
) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .map_err(|e| HashError(format!("hashing task failed: {}", e)))?
}

/// Verify on the blocking pool. A panicked task counts as a mismatch.
pub async fn verify_password(hasher: Arc<dyn PasswordHasher>, plain: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcrypt_round_trip() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("admin123").unwrap();

        assert_ne!(hash, "admin123");
        assert!(hasher.verify("admin123", &hash));
        assert!(!hasher.verify("admin124", &hash));
    }

    #[test]
    fn test_verify_against_garbage_hash_is_false() {
        let hasher = BcryptHasher::new(4);
        assert!(!hasher.verify("admin123", "not-a-bcrypt-hash"));
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(4));
        let hash = hash_password(hasher.clone(), "secret".to_string())
            .await
            .unwrap();

        assert!(verify_password(hasher.clone(), "secret".to_string(), hash.clone()).await);
        assert!(!verify_password(hasher, "other".to_string(), hash).await);
    }
}
