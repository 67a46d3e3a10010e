use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{FromRow, Row};
use tracing::instrument;

use ledgerbook_auth::{Account, Email};
use ledgerbook_core::OwnerId;

use super::AccountStore;
use crate::store::StoreError;
use crate::store::postgres::map_sqlx_error;

/// Postgres-backed account store. Shares the schema applied by
/// [`crate::store::PostgresLedgerStore::migrate`].
#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert_account(&self, mut account: Account) -> Result<Account, StoreError> {
        account.created_at = account.created_at.trunc_subsecs(6);

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.name)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;

        Ok(account)
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let row = AccountRow::from_row(&row)
            .map_err(|e| StoreError::Corrupt(format!("failed to read account row: {e}")))?;
        Account::try_from(row).map(Some)
    }
}

#[derive(Debug)]
struct AccountRow {
    id: uuid::Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::Corrupt(format!("account {}: {e}", row.id)))?;
        Ok(Account {
            id: OwnerId::from_uuid(row.id),
            name: row.name,
            email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}
