use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Account, AccountStore, NewAccount, StoreError, UniqueField};

/// Process-local account store, used when no database is configured.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts
            .read()
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self.accounts.read().values().cloned().collect();
        accounts.sort_by_key(|account| account.created_at);
        Ok(accounts)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .accounts
            .read()
            .values()
            .any(|account| account.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .accounts
            .read()
            .values()
            .any(|account| account.email.as_deref() == Some(email)))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write();

        // Same uniqueness rules as the database constraints
        if accounts.values().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if let Some(email) = account.email.as_deref() {
            if accounts.values().any(|a| a.email.as_deref() == Some(email)) {
                return Err(StoreError::Conflict(UniqueField::Email));
            }
        }

        let stored = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            can_manage_users: account.can_manage_users,
            created_at: Utc::now(),
        };
        accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn set_can_manage(
        &self,
        id: Uuid,
        can_manage_users: bool,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write();
        Ok(accounts.get_mut(&id).map(|account| {
            account.can_manage_users = can_manage_users;
            account.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.accounts.write().remove(&id).is_some())
    }
}
