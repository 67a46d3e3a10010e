//! Owner-scoped ledger persistence.
//!
//! Every operation takes the owner explicitly. A record belonging to a different
//! owner is indistinguishable from a missing one.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

use async_trait::async_trait;
use thiserror::Error;

use ledgerbook_core::{OwnerId, PersonId};
use ledgerbook_ledger::{NewTransaction, Person, PersonName, Transaction};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// A persisted row could not be mapped back into a domain value.
    #[error("stored data is invalid: {0}")]
    Corrupt(String),

    /// The backend itself failed (connection, pool, poisoned lock, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Optional narrowing for [`LedgerStore::list_transactions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub person_id: Option<PersonId>,
}

impl TransactionFilter {
    pub fn for_person(person_id: PersonId) -> Self {
        Self {
            person_id: Some(person_id),
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.person_id.is_none_or(|id| tx.person_id == id)
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_person(&self, owner_id: OwnerId, name: PersonName) -> Result<Person, StoreError>;

    /// Newest first.
    async fn list_people(&self, owner_id: OwnerId) -> Result<Vec<Person>, StoreError>;

    async fn find_person(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> Result<Option<Person>, StoreError>;

    /// Remove a person and all of their transactions in one atomic step.
    ///
    /// Returns the number of cascaded transactions, or `None` (and changes nothing)
    /// when the owner has no such person.
    async fn delete_person(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> Result<Option<u64>, StoreError>;

    /// Record a transaction if the referenced person exists for this owner.
    ///
    /// The existence check and the insert are atomic: a transaction never
    /// outlives a concurrently deleted person.
    async fn insert_transaction(
        &self,
        owner_id: OwnerId,
        request: NewTransaction,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Most recent `occurred_at` first; ties broken by id, descending.
    async fn list_transactions(
        &self,
        owner_id: OwnerId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError>;
}
