use chrono::{DateTime, Utc};
use serde::Deserialize;

use ledgerbook_auth::AccountProfile;
use ledgerbook_core::{DomainResult, PersonId};
use ledgerbook_infra::{LedgerOverview, Session};
use ledgerbook_ledger::{Amount, Direction, NewTransaction, Person, PersonStats, Transaction};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonRequest {
    pub name: String,
}

/// Amounts are integers in minor units (e.g. cents).
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub person_id: String,
    pub amount: i64,
    pub direction: String,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl CreateTransactionRequest {
    pub fn into_domain(self) -> DomainResult<NewTransaction> {
        let person_id: PersonId = self.person_id.parse()?;
        let amount = Amount::new(self.amount)?;
        let direction: Direction = self.direction.parse()?;

        let request = NewTransaction::new(person_id, amount, direction, self.description.as_deref());
        Ok(match self.occurred_at {
            Some(at) => request.occurred_at(at),
            None => request,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    pub person_id: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn session_to_json(session: Session) -> serde_json::Value {
    serde_json::json!({
        "token": session.token,
        "user": profile_to_json(&session.account),
    })
}

pub fn profile_to_json(profile: &AccountProfile) -> serde_json::Value {
    serde_json::json!({
        "id": profile.id.to_string(),
        "name": profile.name,
        "email": profile.email.as_str(),
    })
}

pub fn person_to_json(person: &Person) -> serde_json::Value {
    serde_json::json!({
        "id": person.id.to_string(),
        "name": person.name,
        "created_at": person.created_at.to_rfc3339(),
    })
}

pub fn transaction_to_json(tx: &Transaction) -> serde_json::Value {
    serde_json::json!({
        "id": tx.id.to_string(),
        "person_id": tx.person_id.to_string(),
        "amount": tx.amount.minor_units(),
        "direction": tx.direction.as_str(),
        "description": tx.description,
        "occurred_at": tx.occurred_at.to_rfc3339(),
    })
}

pub fn stats_to_json(stats: &PersonStats) -> serde_json::Value {
    serde_json::json!({
        "person_id": stats.person_id.to_string(),
        "total_credit": stats.total_credit,
        "total_debit": stats.total_debit,
        "net": stats.net,
    })
}

pub fn overview_to_json(overview: &LedgerOverview) -> serde_json::Value {
    serde_json::json!({
        "people": overview.people.iter().map(stats_to_json).collect::<Vec<_>>(),
        "totals": {
            "total_credit": overview.totals.total_credit,
            "total_debit": overview.totals.total_debit,
            "net": overview.totals.net,
        },
    })
}
