//! Account identity: who can sign in and which owner they act as.
//!
//! An account's id *is* the [`OwnerId`] that scopes every ledger record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerbook_core::{DomainError, DomainResult, OwnerId};

/// Normalized e-mail address (trimmed, lowercased).
///
/// Only a minimal shape check is applied; uniqueness is the store's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let email = raw.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self(email)),
            _ => Err(DomainError::validation("email must look like name@domain")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated registration input. The password is still plaintext here.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl NewAccount {
    pub const MIN_PASSWORD_LEN: usize = 8;

    pub fn parse(name: &str, email: &str, password: &str) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let email = Email::parse(email)?;
        if password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {} characters",
                Self::MIN_PASSWORD_LEN
            )));
        }

        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

impl core::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Stored account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: OwnerId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The public view of an account (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: OwnerId,
    pub name: String,
    pub email: Email,
}
