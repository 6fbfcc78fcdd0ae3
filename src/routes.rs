//! HTTP surface: the aggregator callback and a health probe.
//!
//! The callback always answers `200 OK` with a `CON`/`END` body; the
//! aggregator does not interpret HTTP status codes.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::handler::{UssdHandler, UssdRequest};
use crate::menu::prompts;
use crate::reply::UssdReply;

/// Shared state for USSD routes.
#[derive(Clone)]
pub struct UssdRouteState {
    pub handler: Arc<UssdHandler>,
}

/// Build the USSD router.
pub fn ussd_routes(handler: Arc<UssdHandler>) -> Router {
    Router::new()
        .route("/ussd/callback", post(callback))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(UssdRouteState { handler })
}

fn plain(reply: UssdReply) -> impl IntoResponse {
    (StatusCode::OK, reply.render())
}

/// POST /ussd/callback
async fn callback(
    State(state): State<UssdRouteState>,
    form: Result<Form<UssdRequest>, FormRejection>,
) -> impl IntoResponse {
    let request = match form {
        Ok(Form(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable USSD callback body");
            return plain(UssdReply::end(prompts::INVALID_REQUEST));
        }
    };

    // Run on its own task so a panic inside the engine still yields a reply.
    let handler = Arc::clone(&state.handler);
    let session_id = request.session_id.clone();
    let outcome = tokio::spawn(async move { handler.handle(&request).await }).await;

    match outcome {
        Ok(reply) => plain(reply),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "USSD handler task failed");
            plain(UssdReply::end(prompts::SERVICE_UNAVAILABLE))
        }
    }
}

/// GET /health
async fn health(State(state): State<UssdRouteState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ussd-engine",
        "sessions": state.handler.session_count().await,
    }))
}
