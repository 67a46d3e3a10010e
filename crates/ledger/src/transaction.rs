use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerbook_core::{DomainError, DomainResult, OwnedEntity, OwnerId, PersonId, TransactionId};

/// Placeholder stored when a transaction is created without a description.
pub const DEFAULT_DESCRIPTION: &str = "Untitled";

/// Description attached to every settlement transaction.
pub const SETTLEMENT_DESCRIPTION: &str = "Full Settlement";

/// Direction of a money movement, from the owner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increases what the person owes the owner.
    Credit,
    /// Decreases what the person owes the owner (or records a payment out).
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Credit => Direction::Debit,
            Direction::Debit => Direction::Credit,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(Direction::Credit),
            "debit" => Ok(Direction::Debit),
            _ => Err(DomainError::validation(
                "direction must be one of: credit, debit",
            )),
        }
    }
}

/// Positive money amount in the smallest currency unit (e.g. paise, cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    /// Largest amount a single transaction may carry.
    pub const MAX: i64 = 1_000_000_000_000;

    pub fn new(minor_units: i64) -> DomainResult<Self> {
        if minor_units <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        if minor_units > Self::MAX {
            return Err(DomainError::validation(format!(
                "amount cannot exceed {}",
                Self::MAX
            )));
        }
        Ok(Self(minor_units))
    }

    /// Magnitude of a non-zero balance.
    ///
    /// Balances are sums of bounded amounts, so they may exceed [`Amount::MAX`];
    /// only zero has no magnitude.
    pub(crate) fn of_balance(net: i64) -> Option<Self> {
        match net.checked_abs() {
            Some(0) | None => None,
            Some(v) => Some(Self(v)),
        }
    }

    /// Rehydrate a persisted amount. Settlements may exceed [`Amount::MAX`], so
    /// only positivity is checked.
    pub fn from_stored(minor_units: i64) -> Option<Self> {
        (minor_units > 0).then_some(Self(minor_units))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Request to record a new transaction against a person.
///
/// Identity and (unless set) the timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub person_id: PersonId,
    pub amount: Amount,
    pub direction: Direction,
    pub description: String,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// Build a request; a blank or missing description becomes [`DEFAULT_DESCRIPTION`].
    pub fn new(
        person_id: PersonId,
        amount: Amount,
        direction: Direction,
        description: Option<&str>,
    ) -> Self {
        let description = match description.map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => DEFAULT_DESCRIPTION.to_string(),
        };

        Self {
            person_id,
            amount,
            direction,
            description,
            occurred_at: None,
        }
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }
}

/// A single dated, directional money movement against a person.
///
/// Immutable once recorded: balances change only by adding transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: OwnerId,
    pub person_id: PersonId,
    pub amount: Amount,
    pub direction: Direction,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    /// Materialize a request into a stored transaction.
    ///
    /// `now` is used when the request carries no timestamp.
    pub fn record(
        id: TransactionId,
        owner_id: OwnerId,
        request: NewTransaction,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            person_id: request.person_id,
            amount: request.amount,
            direction: request.direction,
            description: request.description,
            occurred_at: request.occurred_at.unwrap_or(now),
        }
    }

    /// Amount with the sign of its effect on the person's net balance.
    pub fn signed_amount(&self) -> i64 {
        match self.direction {
            Direction::Credit => self.amount.minor_units(),
            Direction::Debit => -self.amount.minor_units(),
        }
    }
}

impl OwnedEntity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }

    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}
