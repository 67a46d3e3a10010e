use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerbook_core::{DomainError, DomainResult, OwnedEntity, OwnerId, PersonId};

/// Validated display name of a person.
///
/// Trimmed, non-empty and at most [`PersonName::MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    pub const MAX_LEN: usize = 120;

    pub fn parse(raw: &str) -> DomainResult<Self> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if name.chars().count() > Self::MAX_LEN {
            return Err(DomainError::validation(format!(
                "name cannot be longer than {} characters",
                Self::MAX_LEN
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for PersonName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A counterparty tracked by one owner.
///
/// Persons are never shared between owners. Deleting one removes every
/// transaction recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub owner_id: OwnerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl OwnedEntity for Person {
    type Id = PersonId;

    fn id(&self) -> PersonId {
        self.id
    }

    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}
