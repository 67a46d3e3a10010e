//! Infrastructure layer: persistence, configuration and the services that
//! compose them with the pure ledger engine.

pub mod accounts;
pub mod config;
pub mod identity;
pub mod service;
pub mod store;

pub use accounts::{AccountStore, InMemoryAccountStore, PostgresAccountStore};
pub use config::{AppConfig, ConfigError};
pub use identity::{IdentityService, Session, TokenSigner};
pub use service::{LedgerOverview, LedgerService, ServiceError, ServiceResult};
pub use store::{
    InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, StoreError, TransactionFilter,
};
