//! triage-lambda
//!
//! HTTP surface of the intake service: session endpoints that drive the
//! dialogue state machine, the raw generation proxy, and the note review
//! listing. Runs as an axum app on AWS Lambda.

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health (no attribution needed)
        .route("/health", get(routes::health::health_check))
        .route("/generate", post(routes::generate::generate))
        // Triage sessions
        .route("/sessions", post(routes::sessions::create_session))
        .route(
            "/sessions/{id}",
            get(routes::sessions::get_session).delete(routes::sessions::delete_session),
        )
        .route("/sessions/{id}/start", post(routes::sessions::start_session))
        .route("/sessions/{id}/answers", post(routes::sessions::submit_answer))
        .route("/sessions/{id}/retry", post(routes::sessions::retry_question))
        .route("/sessions/{id}/reset", post(routes::sessions::reset_session))
        // Note review
        .route("/notes", get(routes::notes::list_notes))
        .route("/notes/stats", get(routes::notes::note_stats))
        .route("/notes/{id}", get(routes::notes::get_note))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::attribute_caller,
        ))
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}
