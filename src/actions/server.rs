use super::protocol::{ActionCall, ActionError, ActionResponse};
use super::registry::ActionRegistry;
use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tracing::{info, warn};

pub fn router(registry: Arc<ActionRegistry>) -> Router {
    Router::new()
        .route("/webhook", post(run_action))
        .route("/actions", get(list_actions))
        .route("/health", get(health_check))
        .with_state(registry)
}

/// Serves the action endpoints until Ctrl-C.
pub async fn serve(bind: &str, registry: Arc<ActionRegistry>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind action server to {}", bind))?;

    info!("Action server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, stopping action server");
        })
        .await
        .context("Action server error")
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_actions(State(registry): State<Arc<ActionRegistry>>) -> impl IntoResponse {
    let actions: Vec<_> = registry
        .names()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();
    Json(actions)
}

async fn run_action(
    State(registry): State<Arc<ActionRegistry>>,
    Json(call): Json<ActionCall>,
) -> Response {
    let sender = call
        .sender_id
        .as_deref()
        .or(call.tracker.sender_id.as_deref())
        .unwrap_or("unknown");

    let Some(action) = registry.get(&call.next_action) else {
        warn!("Unknown action '{}' requested by {}", call.next_action, sender);
        return (
            StatusCode::NOT_FOUND,
            Json(ActionError {
                error: format!("No registered action found for name '{}'.", call.next_action),
                action_name: call.next_action.clone(),
            }),
        )
            .into_response();
    };

    let responses = action.run(&call.tracker);
    info!(
        "Ran {} for {} ({} response(s))",
        action.name(),
        sender,
        responses.len()
    );

    Json(ActionResponse {
        events: Vec::new(),
        responses,
    })
    .into_response()
}
