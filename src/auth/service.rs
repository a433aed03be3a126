//! Session issuance, logout, and per-request token resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::accounts::{AccountStore, HashError, PasswordHasher};
use crate::models::Identity;

use super::{fingerprint, AuthError, CredentialVerifier, RevocationStore, TokenCodec};

pub struct AuthService {
    codec: Arc<TokenCodec>,
    revocations: Arc<RevocationStore>,
    accounts: Arc<dyn AccountStore>,
    credentials: CredentialVerifier,
}

impl AuthService {
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: Arc<RevocationStore>,
        accounts: Arc<dyn AccountStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, HashError> {
        let credentials = CredentialVerifier::new(accounts.clone(), hasher)?;
        Ok(Self {
            codec,
            revocations,
            accounts,
            credentials,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn revocations(&self) -> &RevocationStore {
        &self.revocations
    }

    /// Check credentials and issue a token for the account.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let account = match self.credentials.verify(username, password).await {
            Ok(account) => account,
            Err(e) => {
                info!(username, "Login rejected");
                return Err(e);
            }
        };

        let token = self
            .codec
            .issue(&account.username, now)
            .map_err(AuthError::Issue)?;

        info!(username = %account.username, token = %fingerprint(&token), "Issued token");
        Ok(token)
    }

    /// Revoke `token` until it would have expired on its own.
    ///
    /// Strings that do not verify are still recorded, bounded by one token lifetime.
    pub fn logout(&self, token: &str, now: DateTime<Utc>) {
        let expires_at = match self.codec.expiry_of(token) {
            Ok(expires_at) => expires_at,
            Err(_) => now
                .checked_add_signed(self.codec.lifetime())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.revocations.revoke(token, expires_at);
        info!(token = %fingerprint(token), %expires_at, "Token revoked");
    }

    /// Resolve a presented bearer token to an identity.
    ///
    /// Only a revoked token is an error. Invalid or expired tokens and
    /// subjects without an account resolve to `None` so that public routes
    /// keep working; routes that need an identity enforce it themselves.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AuthError> {
        if self.revocations.is_revoked(token) {
            warn!(token = %fingerprint(token), "Rejected revoked token");
            return Err(AuthError::TokenRevoked);
        }

        let subject = match self.codec.verify(token, now) {
            Ok(subject) => subject,
            Err(e) => {
                debug!(
                    token = %fingerprint(token),
                    reason = %e,
                    "Token not accepted; continuing anonymously"
                );
                return Ok(None);
            }
        };

        match self.accounts.find_by_username(&subject).await {
            Ok(Some(account)) => Ok(Some(Identity::from(&account))),
            Ok(None) => {
                debug!(
                    subject = %subject,
                    "Token subject has no account; continuing anonymously"
                );
                Ok(None)
            }
            Err(e) => {
                warn!(
                    subject = %subject,
                    error = %e,
                    "Account lookup failed; continuing anonymously"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{BcryptHasher, InMemoryAccountStore, NewAccount};
    use crate::auth::{SigningContext, TokenError};
    use chrono::{Duration, TimeZone};

    struct Fixture {
        service: AuthService,
        accounts: Arc<InMemoryAccountStore>,
    }

    async fn fixture() -> Fixture {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(4));
        accounts
            .insert(NewAccount {
                username: "admin".to_string(),
                email: Some("admin@example.com".to_string()),
                password_hash: hasher.hash("admin123").unwrap(),
                can_manage_users: true,
            })
            .await
            .unwrap();

        let codec = Arc::new(TokenCodec::new(&SigningContext::new(
            b"test-secret",
            Duration::milliseconds(86_400_000),
        )));
        let service = AuthService::new(
            codec,
            Arc::new(RevocationStore::new()),
            accounts.clone(),
            hasher,
        )
        .unwrap();

        Fixture { service, accounts }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_login_issues_token_for_subject() {
        let fx = fixture().await;
        let token = fx.service.login("admin", "admin123", now()).await.unwrap();

        assert_eq!(fx.service.codec().verify(&token, now()).unwrap(), "admin");
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_fails_login_and_saturates_logout() {
        let fx = fixture().await;
        let codec = Arc::new(TokenCodec::new(&SigningContext::new(
            b"test-secret",
            Duration::days(365 * 1_000_000),
        )));
        let revocations = Arc::new(RevocationStore::new());
        let service = AuthService::new(
            codec,
            revocations.clone(),
            fx.accounts.clone(),
            Arc::new(BcryptHasher::new(4)),
        )
        .unwrap();

        let err = service.login("admin", "admin123", now()).await.unwrap_err();
        assert!(matches!(err, AuthError::Issue(TokenError::Encoding(_))));

        service.logout("not-a-token", now());
        assert!(revocations.is_revoked("not-a-token"));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let fx = fixture().await;

        let unknown = fx.service.login("nobody", "admin123", now()).await.unwrap_err();
        let wrong = fx.service.login("admin", "nope", now()).await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_resolves_identity() {
        let fx = fixture().await;
        let token = fx.service.login("admin", "admin123", now()).await.unwrap();

        let identity = fx.service.authenticate(&token, now()).await.unwrap().unwrap();
        assert_eq!(identity.subject, "admin");
        assert!(identity.can_manage_users);
    }

    #[tokio::test]
    async fn test_expired_token_is_anonymous() {
        let fx = fixture().await;
        let token = fx.service.login("admin", "admin123", now()).await.unwrap();

        let later = now() + Duration::days(2);
        assert!(fx.service.authenticate(&token, later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_token_is_anonymous() {
        let fx = fixture().await;
        assert!(fx
            .service
            .authenticate("definitely.not.valid", now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_revocation_takes_precedence_over_validity() {
        let fx = fixture().await;
        let token = fx.service.login("admin", "admin123", now()).await.unwrap();

        fx.service.logout(&token, now());

        assert!(fx.service.codec().verify(&token, now()).is_ok());
        let err = fx.service.authenticate(&token, now()).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRevoked));
    }

    #[tokio::test]
    async fn test_logout_keeps_entry_until_token_expiry() {
        let fx = fixture().await;
        let token = fx.service.login("admin", "admin123", now()).await.unwrap();
        fx.service.logout(&token, now());

        let before_expiry = now() + Duration::hours(23);
        assert_eq!(fx.service.revocations().sweep_expired(before_expiry), 0);

        let after_expiry = now() + Duration::days(1) + Duration::seconds(1);
        assert_eq!(fx.service.revocations().sweep_expired(after_expiry), 1);
    }

    #[tokio::test]
    async fn test_logout_of_unverifiable_string_is_bounded() {
        let fx = fixture().await;
        fx.service.logout("garbage", now());

        assert!(fx.service.revocations().is_revoked("garbage"));
        let after_lifetime = now() + Duration::days(1) + Duration::seconds(1);
        assert_eq!(fx.service.revocations().sweep_expired(after_lifetime), 1);
    }

    #[tokio::test]
    async fn test_deleted_account_is_anonymous() {
        let fx = fixture().await;
        let token = fx.service.login("admin", "admin123", now()).await.unwrap();

        let admin = fx.accounts.find_by_username("admin").await.unwrap().unwrap();
        fx.accounts.delete(admin.id).await.unwrap();

        assert!(fx.service.authenticate(&token, now()).await.unwrap().is_none());
    }
}
