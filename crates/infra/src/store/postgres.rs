//! Postgres-backed ledger store.
//!
//! ## Owner Isolation
//!
//! Every statement carries `owner_id` in its WHERE clause, and the composite
//! foreign key `(owner_id, person_id) -> people (owner_id, id)` keeps a
//! transaction from pointing at another owner's person.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Row};
use tracing::field::Empty;
use tracing::{Span, instrument};

use ledgerbook_core::{OwnerId, PersonId, TransactionId};
use ledgerbook_ledger::{Amount, NewTransaction, Person, PersonName, Transaction};

use super::{LedgerStore, StoreError, TransactionFilter};

const SCHEMA: &str = include_str!("../../migrations/0001_ledger.sql");

/// Postgres-backed ledger store.
///
/// Uses the SQLx connection pool (thread-safe); multi-statement operations run
/// inside one SQL transaction.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with a small default pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the schema. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, name), fields(owner_id = %owner_id), err)]
    async fn insert_person(&self, owner_id: OwnerId, name: PersonName) -> Result<Person, StoreError> {
        let person = Person {
            id: PersonId::new(),
            owner_id,
            name: name.into_inner(),
            // Postgres keeps microseconds; match it so the returned value equals a later read.
            created_at: Utc::now().trunc_subsecs(6),
        };

        sqlx::query(
            r#"
            INSERT INTO people (id, owner_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(person.id.as_uuid())
        .bind(owner_id.as_uuid())
        .bind(&person.name)
        .bind(person.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_person", e))?;

        Ok(person)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, person_count = Empty), err)]
    async fn list_people(&self, owner_id: OwnerId) -> Result<Vec<Person>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, created_at
            FROM people
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_people", e))?;

        let people = rows
            .iter()
            .map(|row| PersonRow::from_row(row).map(Person::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt(format!("failed to read person row: {e}")))?;

        Span::current().record("person_count", people.len());
        Ok(people)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id, person_id = %person_id), err)]
    async fn find_person(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> Result<Option<Person>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, created_at
            FROM people
            WHERE owner_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(person_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_person", e))?;

        row.map(|row| PersonRow::from_row(&row).map(Person::from))
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("failed to read person row: {e}")))
    }

    #[instrument(
        skip(self),
        fields(owner_id = %owner_id, person_id = %person_id, cascaded = Empty),
        err
    )]
    async fn delete_person(
        &self,
        owner_id: OwnerId,
        person_id: PersonId,
    ) -> Result<Option<u64>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Lock the person row; concurrent inserts referencing it wait on the FK check.
        let locked = sqlx::query(
            r#"
            SELECT id FROM people
            WHERE owner_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(person_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_person", e))?;

        if locked.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        }

        let cascaded = sqlx::query("DELETE FROM transactions WHERE owner_id = $1 AND person_id = $2")
            .bind(owner_id.as_uuid())
            .bind(person_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_transactions", e))?
            .rows_affected();

        sqlx::query("DELETE FROM people WHERE owner_id = $1 AND id = $2")
            .bind(owner_id.as_uuid())
            .bind(person_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_person", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("cascaded", cascaded);
        Ok(Some(cascaded))
    }

    #[instrument(
        skip(self, request),
        fields(owner_id = %owner_id, person_id = %request.person_id, direction = %request.direction),
        err
    )]
    async fn insert_transaction(
        &self,
        owner_id: OwnerId,
        request: NewTransaction,
    ) -> Result<Option<Transaction>, StoreError> {
        let now = Utc::now().trunc_subsecs(6);
        let mut record = Transaction::record(TransactionId::new(), owner_id, request, now);
        record.occurred_at = record.occurred_at.trunc_subsecs(6);

        // Insert-if-exists is a single statement, so the person check cannot go stale.
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (id, owner_id, person_id, amount, direction, description, occurred_at)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE EXISTS (SELECT 1 FROM people WHERE owner_id = $2 AND id = $3)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(owner_id.as_uuid())
        .bind(record.person_id.as_uuid())
        .bind(record.amount.minor_units())
        .bind(record.direction.as_str())
        .bind(&record.description)
        .bind(record.occurred_at)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(Some(record)),
            Ok(_) => Ok(None),
            // The person was deleted between the EXISTS check and the FK check.
            Err(e) if is_foreign_key_violation(&e) => Ok(None),
            Err(e) => Err(map_sqlx_error("insert_transaction", e)),
        }
    }

    #[instrument(
        skip(self),
        fields(owner_id = %owner_id, person_id = ?filter.person_id, transaction_count = Empty),
        err
    )]
    async fn list_transactions(
        &self,
        owner_id: OwnerId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let person_param: Option<uuid::Uuid> = filter.person_id.map(|id| *id.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, person_id, amount, direction, description, occurred_at
            FROM transactions
            WHERE owner_id = $1
                AND ($2::uuid IS NULL OR person_id = $2)
            ORDER BY occurred_at DESC, id DESC
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(person_param)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_transactions", e))?;

        let mut txs = Vec::with_capacity(rows.len());
        for row in &rows {
            let row = TransactionRow::from_row(row)
                .map_err(|e| StoreError::Corrupt(format!("failed to read transaction row: {e}")))?;
            txs.push(Transaction::try_from(row)?);
        }

        Span::current().record("transaction_count", txs.len());
        Ok(txs)
    }
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23503");
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct PersonRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PersonRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PersonRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: PersonId::from_uuid(row.id),
            owner_id: OwnerId::from_uuid(row.owner_id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct TransactionRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    person_id: uuid::Uuid,
    amount: i64,
    direction: String,
    description: String,
    occurred_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TransactionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TransactionRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            person_id: row.try_get("person_id")?,
            amount: row.try_get("amount")?,
            direction: row.try_get("direction")?,
            description: row.try_get("description")?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let direction = row
            .direction
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("transaction {}: {e}", row.id)))?;
        // Settlements may exceed the per-request cap, so only positivity is rechecked.
        let amount = Amount::from_stored(row.amount)
            .ok_or_else(|| StoreError::Corrupt(format!("transaction {}: non-positive amount", row.id)))?;

        Ok(Transaction {
            id: TransactionId::from_uuid(row.id),
            owner_id: OwnerId::from_uuid(row.owner_id),
            person_id: PersonId::from_uuid(row.person_id),
            amount,
            direction,
            description: row.description,
            occurred_at: row.occurred_at,
        })
    }
}
