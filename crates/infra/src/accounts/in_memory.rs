use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ledgerbook_auth::{Account, Email};

use super::AccountStore;
use crate::store::StoreError;

/// In-memory account store for tests/dev, keyed by normalized e-mail.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<HashMap<Email, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("account lock poisoned".to_string()))?;

        if map.contains_key(&account.email) {
            return Err(StoreError::Duplicate(format!(
                "email {} is already registered",
                account.email
            )));
        }
        map.insert(account.email.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("account lock poisoned".to_string()))?;
        Ok(map.get(email).cloned())
    }
}
