use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

/// Per-person stats plus grand totals for the calling owner.
pub async fn overview(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.ledger.get_overview(owner.owner_id()).await {
        Ok(overview) => (StatusCode::OK, Json(dto::overview_to_json(&overview))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
