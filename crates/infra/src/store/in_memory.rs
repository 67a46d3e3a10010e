use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use ledgerbook_core::{OwnedEntity, OwnerId, PersonId, TransactionId};
use ledgerbook_ledger::{NewTransaction, Person, PersonName, Transaction};

use super::{LedgerStore, StoreError, TransactionFilter};

#[derive(Debug, Default)]
struct Tables {
    people: Vec<Person>,
    transactions: Vec<Transaction>,
}

/// In-memory ledger store for tests/dev.
///
/// Both collections sit behind a single lock, so a cascade delete and a
/// person-checked insert can never interleave.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_person(&self, owner_id: OwnerId, name: PersonName) -> Result<Person, StoreError> {
        let person = Person {
            id: PersonId::new(),
            owner_id,
            name: name.into_inner(),
            created_at: Utc::now(),
        };
        self.write()?.people.push(person.clone());
        Ok(person)
    }

    async fn list_people(&self, owner_id: OwnerId) -> Result<Vec<Person>, StoreError> {
        let mut people: Vec<Person> = self
            .read()?
            .people
            .iter()
            .filter(|p| p.is_owned_by(owner_id))
            .cloned()
            .collect();
        people.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(people)
    }

    async fn find_person(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> Result<Option<Person>, StoreError> {
        Ok(self
            .read()?
            .people
            .iter()
            .find(|p| p.id == person_id && p.is_owned_by(owner_id))
            .cloned())
    }

    async fn delete_person(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> Result<Option<u64>, StoreError> {
        let mut tables = self.write()?;

        let Some(pos) = tables
            .people
            .iter()
            .position(|p| p.id == person_id && p.is_owned_by(owner_id))
        else {
            return Ok(None);
        };
        tables.people.remove(pos);

        let before = tables.transactions.len();
        tables
            .transactions
            .retain(|tx| !(tx.person_id == person_id && tx.is_owned_by(owner_id)));
        Ok(Some((before - tables.transactions.len()) as u64))
    }

    async fn insert_transaction(
        &self,
        owner_id: OwnerId,
        request: NewTransaction,
    ) -> Result<Option<Transaction>, StoreError> {
        let mut tables = self.write()?;

        let person_exists = tables
            .people
            .iter()
            .any(|p| p.id == request.person_id && p.is_owned_by(owner_id));
        if !person_exists {
            return Ok(None);
        }

        let tx = Transaction::record(TransactionId::new(), owner_id, request, Utc::now());
        tables.transactions.push(tx.clone());
        Ok(Some(tx))
    }

    async fn list_transactions(
        &self,
        owner_id: OwnerId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut txs: Vec<Transaction> = self
            .read()?
            .transactions
            .iter()
            .filter(|tx| tx.is_owned_by(owner_id) && filter.matches(tx))
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        Ok(txs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ledgerbook_ledger::{Amount, Direction};

    fn name(raw: &str) -> PersonName {
        PersonName::parse(raw).unwrap()
    }

    fn credit(person_id: PersonId, amount: i64) -> NewTransaction {
        NewTransaction::new(person_id, Amount::new(amount).unwrap(), Direction::Credit, None)
    }

    #[tokio::test]
    async fn owners_never_see_each_others_people() {
        let store = InMemoryLedgerStore::new();
        let a = OwnerId::new();
        let b = OwnerId::new();

        let alex = store.insert_person(a, name("Alex")).await.unwrap();
        store.insert_person(b, name("Sam")).await.unwrap();

        let a_people = store.list_people(a).await.unwrap();
        assert_eq!(a_people.len(), 1);
        assert_eq!(a_people[0].name, "Alex");

        assert_eq!(store.find_person(b, alex.id).await.unwrap(), None);
        assert_eq!(store.delete_person(b, alex.id).await.unwrap(), None);
        assert!(store.find_person(a, alex.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn people_are_listed_newest_first() {
        let store = InMemoryLedgerStore::new();
        let owner = OwnerId::new();
        let first = store.insert_person(owner, name("First")).await.unwrap();
        let second = store.insert_person(owner, name("Second")).await.unwrap();

        let ids: Vec<_> = store
            .list_people(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn transaction_for_foreign_person_is_refused() {
        let store = InMemoryLedgerStore::new();
        let a = OwnerId::new();
        let b = OwnerId::new();
        let alex = store.insert_person(a, name("Alex")).await.unwrap();

        assert_eq!(store.insert_transaction(b, credit(alex.id, 10)).await.unwrap(), None);
        assert_eq!(
            store.insert_transaction(a, credit(PersonId::new(), 10)).await.unwrap(),
            None
        );
        assert!(store
            .list_transactions(b, TransactionFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_only_that_persons_transactions() {
        let store = InMemoryLedgerStore::new();
        let owner = OwnerId::new();
        let alex = store.insert_person(owner, name("Alex")).await.unwrap();
        let sam = store.insert_person(owner, name("Sam")).await.unwrap();

        store.insert_transaction(owner, credit(alex.id, 10)).await.unwrap();
        store.insert_transaction(owner, credit(alex.id, 20)).await.unwrap();
        let kept = store
            .insert_transaction(owner, credit(sam.id, 30))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.delete_person(owner, alex.id).await.unwrap(), Some(2));
        assert_eq!(store.find_person(owner, alex.id).await.unwrap(), None);

        let remaining = store
            .list_transactions(owner, TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(remaining, vec![kept]);

        // Deleting again is a miss, not a second cascade.
        assert_eq!(store.delete_person(owner, alex.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn transactions_are_listed_by_date_descending() {
        let store = InMemoryLedgerStore::new();
        let owner = OwnerId::new();
        let alex = store.insert_person(owner, name("Alex")).await.unwrap();
        let sam = store.insert_person(owner, name("Sam")).await.unwrap();
        let now = Utc::now();

        let old = store
            .insert_transaction(owner, credit(alex.id, 1).occurred_at(now - Duration::days(2)))
            .await
            .unwrap()
            .unwrap();
        let new = store
            .insert_transaction(owner, credit(alex.id, 2).occurred_at(now))
            .await
            .unwrap()
            .unwrap();
        let mid = store
            .insert_transaction(owner, credit(sam.id, 3).occurred_at(now - Duration::days(1)))
            .await
            .unwrap()
            .unwrap();

        let all: Vec<_> = store
            .list_transactions(owner, TransactionFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(all, vec![new.id, mid.id, old.id]);

        let alex_only: Vec<_> = store
            .list_transactions(owner, TransactionFilter::for_person(alex.id))
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(alex_only, vec![new.id, old.id]);
    }
}
