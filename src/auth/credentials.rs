use std::sync::Arc;

use crate::accounts::{verify_password, Account, AccountStore, HashError, PasswordHasher};

use super::AuthError;

/// Checks a username/password pair against the account store.
pub struct CredentialVerifier {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<dyn PasswordHasher>,
    // Compared against when the username is unknown so both failures cost one hash check.
    dummy_hash: String,
}

impl CredentialVerifier {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, HashError> {
        let dummy_hash = hasher.hash("tokengate-dummy-password")?;
        Ok(Self {
            accounts,
            hasher,
            dummy_hash,
        })
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        let account = self.accounts.find_by_username(username).await?;

        let hash = account
            .as_ref()
            .map(|account| account.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let matches = verify_password(self.hasher.clone(), password.to_string(), hash).await;

        match account {
            Some(account) if matches => Ok(account),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{BcryptHasher, InMemoryAccountStore, NewAccount};

    async fn verifier() -> CredentialVerifier {
        let store = Arc::new(InMemoryAccountStore::new());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(4));
        store
            .insert(NewAccount {
                username: "admin".to_string(),
                email: None,
                password_hash: hasher.hash("admin123").unwrap(),
                can_manage_users: true,
            })
            .await
            .unwrap();
        CredentialVerifier::new(store, hasher).unwrap()
    }

    #[tokio::test]
    async fn test_correct_password_yields_account() {
        let verifier = verifier().await;
        let account = verifier.verify("admin", "admin123").await.unwrap();
        assert_eq!(account.username, "admin");
        assert!(account.can_manage_users);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_fail_identically() {
        let verifier = verifier().await;

        let wrong_password = verifier.verify("admin", "wrong").await.unwrap_err();
        let unknown_user = verifier.verify("ghost", "admin123").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_dummy_password_does_not_authenticate_unknown_user() {
        let verifier = verifier().await;
        let err = verifier
            .verify("ghost", "tokengate-dummy-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
