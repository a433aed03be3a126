//! Account persistence consumed by the authentication pipeline.

mod memory;
mod password;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use memory::InMemoryAccountStore;
pub use password::{hash_password, verify_password, BcryptHasher, HashError, PasswordHasher};
pub use postgres::PgAccountStore;

/// Stored account record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub can_manage_users: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create an account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub can_manage_users: bool,
}

/// Unique column an insert collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict on {0}")]
    Conflict(UniqueField),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Returns `None` when no account has `id`.
    async fn set_can_manage(
        &self,
        id: Uuid,
        can_manage_users: bool,
    ) -> Result<Option<Account>, StoreError>;

    /// Returns whether an account was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
