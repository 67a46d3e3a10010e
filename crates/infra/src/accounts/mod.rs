//! Account persistence for sign-up and sign-in.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryAccountStore;
pub use postgres::PostgresAccountStore;

use async_trait::async_trait;

use ledgerbook_auth::{Account, Email};

use crate::store::StoreError;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account. A second account with the same e-mail is
    /// rejected with [`StoreError::Duplicate`].
    async fn insert_account(&self, account: Account) -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;
}
