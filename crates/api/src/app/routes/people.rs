use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use ledgerbook_core::PersonId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_people).post(add_person))
        .route("/:id", delete(delete_person))
        .route("/:id/stats", get(person_stats))
        .route("/:id/settle", post(settle_person))
}

pub async fn list_people(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.ledger.list_people(owner.owner_id()).await {
        Ok(people) => {
            let items = people.iter().map(dto::person_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_person(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<dto::CreatePersonRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.ledger.add_person(owner.owner_id(), &body.name).await {
        Ok(person) => (StatusCode::CREATED, Json(dto::person_to_json(&person))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_person(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let person_id: PersonId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.delete_person(owner.owner_id(), person_id).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": person_id.to_string(),
                "transactions_removed": removed,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn person_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let person_id: PersonId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.get_stats(owner.owner_id(), person_id).await {
        Ok(stats) => (StatusCode::OK, Json(dto::stats_to_json(&stats))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `201` with the settlement transaction, or `204` when the balance was already zero.
pub async fn settle_person(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let person_id: PersonId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.settle(owner.owner_id(), person_id).await {
        Ok(Some(tx)) => (StatusCode::CREATED, Json(dto::transaction_to_json(&tx))).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
