//! `ledgerbook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! owner-scoped identifiers, the shared error taxonomy and the entity contract.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::OwnedEntity;
pub use error::{DomainError, DomainResult};
pub use id::{OwnerId, PersonId, TransactionId};
