//! Owner-scoped ledger operations.
//!
//! `LedgerService` composes a [`LedgerStore`] with the pure engine in
//! `ledgerbook-ledger`: it loads the owner's records, derives balances on
//! demand and appends settlements. Stats are never cached or persisted.
//!
//! ## Concurrency
//!
//! Requests are independent. There is no cross-request locking, versioning or
//! idempotency key; two near-simultaneous settlements of the same person can
//! both be appended. Each single write is atomic at the store.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use ledgerbook_core::{DomainError, OwnerId, PersonId};
use ledgerbook_ledger::{
    GrandTotals, NewTransaction, Person, PersonName, PersonStats, Transaction, build_settlement,
    compute_all_stats, compute_grand_totals, compute_stats,
};

use crate::store::{LedgerStore, StoreError, TransactionFilter};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Input failed validation (deterministic).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, or owned by someone else.
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    /// Sign-in failed. Unknown e-mail and wrong password are not told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The persistence or identity collaborator failed.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound => ServiceError::NotFound,
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Per-person stats and the grand totals, derived from one read of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOverview {
    pub people: Vec<PersonStats>,
    pub totals: GrandTotals,
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    pub async fn list_people(&self, owner_id: OwnerId) -> ServiceResult<Vec<Person>> {
        Ok(self.store.list_people(owner_id).await?)
    }

    #[instrument(skip(self, name), fields(owner_id = %owner_id), err)]
    pub async fn add_person(&self, owner_id: OwnerId, name: &str) -> ServiceResult<Person> {
        let name = PersonName::parse(name)?;
        let person = self.store.insert_person(owner_id, name).await?;
        info!(person_id = %person.id, "person added");
        Ok(person)
    }

    /// Remove a person together with their transactions.
    ///
    /// Returns how many transactions went with them.
    #[instrument(skip(self), fields(owner_id = %owner_id, person_id = %person_id), err)]
    pub async fn delete_person(&self, owner_id: OwnerId, person_id: PersonId) -> ServiceResult<u64> {
        let cascaded = self
            .store
            .delete_person(owner_id, person_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        info!(cascaded, "person deleted");
        Ok(cascaded)
    }

    /// Newest first. Narrowing to a person the owner does not have is `NotFound`.
    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    pub async fn list_transactions(
        &self,
        owner_id: OwnerId,
        filter: TransactionFilter,
    ) -> ServiceResult<Vec<Transaction>> {
        if let Some(person_id) = filter.person_id {
            self.require_person(owner_id, person_id).await?;
        }
        Ok(self.store.list_transactions(owner_id, filter).await?)
    }

    #[instrument(
        skip(self, request),
        fields(owner_id = %owner_id, person_id = %request.person_id),
        err
    )]
    pub async fn add_transaction(
        &self,
        owner_id: OwnerId,
        request: NewTransaction,
    ) -> ServiceResult<Transaction> {
        self.store
            .insert_transaction(owner_id, request)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, person_id = %person_id), err)]
    pub async fn get_stats(&self, owner_id: OwnerId, person_id: PersonId) -> ServiceResult<PersonStats> {
        self.require_person(owner_id, person_id).await?;
        let txs = self
            .store
            .list_transactions(owner_id, TransactionFilter::for_person(person_id))
            .await?;
        Ok(compute_stats(&txs, person_id))
    }

    /// Stats for every person, in listing order.
    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    pub async fn get_all_stats(&self, owner_id: OwnerId) -> ServiceResult<Vec<PersonStats>> {
        let (people, txs) = self.load_ledger(owner_id).await?;
        Ok(compute_all_stats(&people, &txs))
    }

    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    pub async fn get_grand_totals(&self, owner_id: OwnerId) -> ServiceResult<GrandTotals> {
        let (people, txs) = self.load_ledger(owner_id).await?;
        Ok(compute_grand_totals(&people, &txs))
    }

    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    pub async fn get_overview(&self, owner_id: OwnerId) -> ServiceResult<LedgerOverview> {
        let (people, txs) = self.load_ledger(owner_id).await?;
        Ok(LedgerOverview {
            people: compute_all_stats(&people, &txs),
            totals: compute_grand_totals(&people, &txs),
        })
    }

    /// Append the transaction that brings the person's balance to zero.
    ///
    /// `Ok(None)` when the balance is already zero; nothing is written then.
    #[instrument(skip(self), fields(owner_id = %owner_id, person_id = %person_id), err)]
    pub async fn settle(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> ServiceResult<Option<Transaction>> {
        let stats = self.get_stats(owner_id, person_id).await?;

        let Some(request) = build_settlement(person_id, stats.net) else {
            info!("balance already settled");
            return Ok(None);
        };

        let tx = self.add_transaction(owner_id, request).await?;
        info!(transaction_id = %tx.id, amount = %tx.amount, direction = %tx.direction, "balance settled");
        Ok(Some(tx))
    }

    async fn require_person(&self, owner_id: OwnerId, person_id: PersonId) -> ServiceResult<Person> {
        self.store
            .find_person(owner_id, person_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    async fn load_ledger(&self, owner_id: OwnerId) -> ServiceResult<(Vec<Person>, Vec<Transaction>)> {
        let people = self.store.list_people(owner_id).await?;
        let txs = self
            .store
            .list_transactions(owner_id, TransactionFilter::default())
            .await?;
        Ok((people, txs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;
    use ledgerbook_ledger::{Amount, Direction, SETTLEMENT_DESCRIPTION};

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(InMemoryLedgerStore::new()))
    }

    fn request(person_id: PersonId, amount: i64, direction: Direction, description: &str) -> NewTransaction {
        NewTransaction::new(person_id, Amount::new(amount).unwrap(), direction, Some(description))
    }

    #[tokio::test]
    async fn alex_end_to_end() {
        let svc = service();
        let owner = OwnerId::new();

        let alex = svc.add_person(owner, "Alex").await.unwrap();
        svc.add_transaction(owner, request(alex.id, 200, Direction::Credit, "Dinner"))
            .await
            .unwrap();
        svc.add_transaction(owner, request(alex.id, 50, Direction::Debit, "Paid back"))
            .await
            .unwrap();

        let stats = svc.get_stats(owner, alex.id).await.unwrap();
        assert_eq!((stats.total_credit, stats.total_debit, stats.net), (200, 50, 150));

        let settlement = svc.settle(owner, alex.id).await.unwrap().unwrap();
        assert_eq!(settlement.direction, Direction::Debit);
        assert_eq!(settlement.amount.minor_units(), 150);
        assert_eq!(settlement.description, SETTLEMENT_DESCRIPTION);

        let stats = svc.get_stats(owner, alex.id).await.unwrap();
        assert_eq!((stats.total_credit, stats.total_debit, stats.net), (200, 200, 0));

        // Settling a settled balance writes nothing.
        assert_eq!(svc.settle(owner, alex.id).await.unwrap(), None);
        let txs = svc
            .list_transactions(owner, TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(txs.len(), 3);
    }

    #[tokio::test]
    async fn blank_person_name_is_rejected() {
        let svc = service();
        let err = svc.add_person(OwnerId::new(), "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn other_owners_person_is_not_found_everywhere() {
        let svc = service();
        let owner = OwnerId::new();
        let intruder = OwnerId::new();
        let alex = svc.add_person(owner, "Alex").await.unwrap();
        svc.add_transaction(owner, request(alex.id, 10, Direction::Credit, "x"))
            .await
            .unwrap();

        assert_eq!(svc.get_stats(intruder, alex.id).await, Err(ServiceError::NotFound));
        assert_eq!(svc.settle(intruder, alex.id).await, Err(ServiceError::NotFound));
        assert_eq!(svc.delete_person(intruder, alex.id).await, Err(ServiceError::NotFound));
        assert_eq!(
            svc.add_transaction(intruder, request(alex.id, 10, Direction::Debit, "y"))
                .await,
            Err(ServiceError::NotFound)
        );
        assert_eq!(
            svc.list_transactions(intruder, TransactionFilter::for_person(alex.id))
                .await,
            Err(ServiceError::NotFound)
        );

        // The owner's data is untouched.
        assert_eq!(svc.get_stats(owner, alex.id).await.unwrap().net, 10);
        assert!(svc.list_people(intruder).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_person_removes_their_transactions() {
        let svc = service();
        let owner = OwnerId::new();
        let alex = svc.add_person(owner, "Alex").await.unwrap();
        let sam = svc.add_person(owner, "Sam").await.unwrap();
        svc.add_transaction(owner, request(alex.id, 10, Direction::Credit, "a"))
            .await
            .unwrap();
        svc.add_transaction(owner, request(sam.id, 25, Direction::Debit, "b"))
            .await
            .unwrap();

        assert_eq!(svc.delete_person(owner, alex.id).await.unwrap(), 1);
        assert_eq!(svc.get_stats(owner, alex.id).await, Err(ServiceError::NotFound));

        let totals = svc.get_grand_totals(owner).await.unwrap();
        assert_eq!(
            totals,
            GrandTotals {
                total_credit: 0,
                total_debit: 25,
                net: -25,
            }
        );
    }

    #[tokio::test]
    async fn overview_matches_individual_queries() {
        let svc = service();
        let owner = OwnerId::new();
        let alex = svc.add_person(owner, "Alex").await.unwrap();
        let sam = svc.add_person(owner, "Sam").await.unwrap();
        svc.add_transaction(owner, request(alex.id, 70, Direction::Credit, "a"))
            .await
            .unwrap();
        svc.add_transaction(owner, request(sam.id, 30, Direction::Debit, "b"))
            .await
            .unwrap();

        let overview = svc.get_overview(owner).await.unwrap();
        assert_eq!(overview.people, svc.get_all_stats(owner).await.unwrap());
        assert_eq!(overview.totals, svc.get_grand_totals(owner).await.unwrap());
        assert_eq!(overview.totals.net, 40);
        // Listing order: newest person first.
        assert_eq!(overview.people[0].person_id, sam.id);
    }

    #[tokio::test]
    async fn negative_balance_settles_with_credit() {
        let svc = service();
        let owner = OwnerId::new();
        let sam = svc.add_person(owner, "Sam").await.unwrap();
        svc.add_transaction(owner, request(sam.id, 75, Direction::Debit, "Lent"))
            .await
            .unwrap();

        let tx = svc.settle(owner, sam.id).await.unwrap().unwrap();
        assert_eq!(tx.direction, Direction::Credit);
        assert_eq!(tx.amount.minor_units(), 75);
        assert!(svc.get_stats(owner, sam.id).await.unwrap().is_settled());
    }
}
