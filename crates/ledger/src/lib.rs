//! Ledger domain module (people, transactions, balances).
//!
//! This crate contains the balance-derivation and settlement rules, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage, no id generation).

pub mod engine;
pub mod person;
pub mod transaction;

pub use engine::{
    GrandTotals, PersonStats, build_settlement, compute_all_stats, compute_grand_totals,
    compute_stats,
};
pub use person::{Person, PersonName};
pub use transaction::{
    Amount, DEFAULT_DESCRIPTION, Direction, NewTransaction, SETTLEMENT_DESCRIPTION, Transaction,
};
