use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod people;
pub mod stats;
pub mod system;
pub mod transactions;

/// Router for all authenticated (owner-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stats", get(stats::overview))
        .nest("/people", people::router())
        .nest("/transactions", transactions::router())
}

/// Router for sign-up and sign-in; no token required.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}
