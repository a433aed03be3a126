//! Account management on top of the account store

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::accounts::{
    hash_password, Account, AccountStore, HashError, NewAccount, PasswordHasher, StoreError,
    UniqueField,
};
use crate::config::AdminSeed;
use crate::models::RegisterRequest;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already in use")]
    EmailInUse,

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),
}

// A unique violation from the store means another request won the race
// between the existence checks and the insert.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(UniqueField::Username) => ServiceError::UsernameTaken,
            StoreError::Conflict(UniqueField::Email) => ServiceError::EmailInUse,
            other => ServiceError::Store(other),
        }
    }
}

pub struct UserService {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { accounts, hasher }
    }

    /// Register a new account after validating and hashing the password
    pub async fn register(&self, request: RegisterRequest) -> Result<Account, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        if self.accounts.exists_by_username(&request.username).await? {
            return Err(ServiceError::UsernameTaken);
        }
        if let Some(email) = request.email.as_deref() {
            if self.accounts.exists_by_email(email).await? {
                return Err(ServiceError::EmailInUse);
            }
        }

        let password_hash = hash_password(self.hasher.clone(), request.password).await?;
        let account = self
            .accounts
            .insert(NewAccount {
                username: request.username,
                email: request.email,
                password_hash,
                can_manage_users: request.can_manage_users.unwrap_or(false),
            })
            .await?;

        info!(username = %account.username, id = %account.id, "Registered account");
        Ok(account)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Account, ServiceError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Account>, ServiceError> {
        Ok(self.accounts.list().await?)
    }

    pub async fn set_can_manage(
        &self,
        id: Uuid,
        can_manage_users: bool,
    ) -> Result<Account, ServiceError> {
        let account = self
            .accounts
            .set_can_manage(id, can_manage_users)
            .await?
            .ok_or(ServiceError::NotFound)?;

        info!(id = %id, can_manage_users, "Updated manage flag");
        Ok(account)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.accounts.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        info!(id = %id, "Deleted account");
        Ok(())
    }

    /// Create the administrator account unless one with that username exists
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), ServiceError> {
        if self.accounts.exists_by_username(&seed.username).await? {
            info!(username = %seed.username, "Admin account already present");
            return Ok(());
        }

        let password_hash = hash_password(self.hasher.clone(), seed.password.clone()).await?;
        let inserted = self
            .accounts
            .insert(NewAccount {
                username: seed.username.clone(),
                email: Some(seed.email.clone()),
                password_hash,
                can_manage_users: true,
            })
            .await;

        match inserted {
            Ok(_) => {
                info!(username = %seed.username, "Seeded admin account");
                Ok(())
            }
            Err(StoreError::Conflict(UniqueField::Username)) => {
                info!(username = %seed.username, "Admin account already present");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
