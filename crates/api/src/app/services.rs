use std::sync::Arc;

use ledgerbook_auth::{Argon2Hasher, Hs256Jwt};
use ledgerbook_infra::{
    AccountStore, AppConfig, IdentityService, InMemoryAccountStore, InMemoryLedgerStore,
    LedgerService, LedgerStore, PostgresAccountStore, PostgresLedgerStore, StoreError,
};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: LedgerService,
    pub identity: IdentityService,
}

impl AppServices {
    pub fn new(
        ledger_store: Arc<dyn LedgerStore>,
        account_store: Arc<dyn AccountStore>,
        config: &AppConfig,
    ) -> Self {
        let tokens = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl));
        Self {
            ledger: LedgerService::new(ledger_store),
            identity: IdentityService::new(account_store, Arc::new(Argon2Hasher::new()), tokens),
        }
    }

    /// Everything in process memory; state is lost on restart.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryAccountStore::new()),
            config,
        )
    }
}

/// Pick the storage backend from configuration: Postgres when a database URL is
/// set (schema applied on startup), memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; using in-memory storage");
        return Ok(AppServices::in_memory(config));
    };

    let ledger = PostgresLedgerStore::connect(url).await?;
    ledger.migrate().await?;
    let accounts = PostgresAccountStore::new(ledger.pool().clone());
    tracing::info!("using postgres storage");

    Ok(AppServices::new(Arc::new(ledger), Arc::new(accounts), config))
}
