use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use ledgerbook_core::PersonId;
use ledgerbook_infra::TransactionFilter;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_transactions).post(add_transaction))
}

/// Newest first; `?person_id=` narrows to one person.
pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    query: Result<Query<dto::TransactionListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };

    let filter = match query.person_id.as_deref().map(str::parse::<PersonId>) {
        None => TransactionFilter::default(),
        Some(Ok(person_id)) => TransactionFilter::for_person(person_id),
        Some(Err(e)) => return errors::domain_error_to_response(e),
    };

    match services.ledger.list_transactions(owner.owner_id(), filter).await {
        Ok(txs) => {
            let items = txs.iter().map(dto::transaction_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<dto::CreateTransactionRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let request = match body.into_domain() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.add_transaction(owner.owner_id(), request).await {
        Ok(tx) => (StatusCode::CREATED, Json(dto::transaction_to_json(&tx))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
