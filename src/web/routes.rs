use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use super::WebState;
use crate::error::SettingsError;
use crate::mode::OperatingMode;
use crate::settings::SettingsUpdate;

/// Router for `state.mode`.
pub fn router(state: WebState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/api/status", get(status))
        .route("/api/settings", get(get_settings).post(post_settings));

    if state.mode == OperatingMode::Normal {
        app = app.route("/api/display", get(display));
    }
    app.with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn index(State(state): State<WebState>) -> impl IntoResponse {
    let settings = state.settings.load().await;
    Json(json!({
        "name": "gitglow",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.mode,
        "configured": settings.is_configured(),
    }))
}

async fn status(State(state): State<WebState>) -> impl IntoResponse {
    Json(json!({
        "mode": state.mode,
        "tasks": state.status.snapshot().await,
    }))
}

async fn get_settings(State(state): State<WebState>) -> impl IntoResponse {
    Json(state.settings.load().await.redacted())
}

async fn post_settings(
    State(state): State<WebState>,
    Json(patch): Json<SettingsUpdate>,
) -> impl IntoResponse {
    match state.settings.update(patch).await {
        Ok(next) => (
            StatusCode::OK,
            Json(json!({
                "saved": true,
                "configured": next.is_configured(),
                "restart_required": true,
            })),
        ),
        Err(e) => {
            let code = match e {
                SettingsError::Invalid(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error!(error = %e, label = e.as_label(), "settings update rejected");
            (
                code,
                Json(json!({ "error": e.to_string(), "kind": e.as_label() })),
            )
        }
    }
}

async fn display(State(state): State<WebState>) -> impl IntoResponse {
    let frame = match &state.display {
        Some(d) => d.frame().await,
        None => None,
    };
    match frame {
        Some(frame) => (StatusCode::OK, Json(json!(frame))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "display has no frame buffer" })),
        ),
    }
}
