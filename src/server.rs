//! HTTP surface for the leaderboard

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::ServerConfig;
use crate::leaderboard::{LeaderboardEntry, LeaderboardService, Rankings, SubmitError};

pub type SharedService = Arc<LeaderboardService>;

pub const SERVICE_NAME: &str = "glyph-breakout-leaderboard";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    success: bool,
    saved_score: LeaderboardEntry,
}

pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/ranking", get(get_ranking).post(post_ranking))
        .route("/health", get(health))
        .with_state(service)
}

/// Bind and serve until the listener fails
pub async fn serve(config: &ServerConfig) -> std::io::Result<()> {
    let service = Arc::new(LeaderboardService::from_config(config));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!(
        "Leaderboard listening on {} ({} backend)",
        config.bind_addr,
        service.active_backend()
    );
    axum::serve(listener, router(service)).await
}

async fn health(State(service): State<SharedService>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "backend": service.active_backend(),
    }))
}

/// Always the three-tier envelope, empty tiers on failure
async fn get_ranking(State(service): State<SharedService>) -> Json<Rankings> {
    Json(service.rankings())
}

async fn post_ranking(State(service): State<SharedService>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let body = json!({ "error": format!("Invalid JSON body: {e}") });
            return error_response(StatusCode::BAD_REQUEST, body);
        }
    };

    match service.submit_json(&value) {
        Ok(entry) => Json(SaveResponse {
            success: true,
            saved_score: entry,
        })
        .into_response(),
        Err(SubmitError::Invalid(e)) => {
            log::info!("Rejected submission: {}", e);
            error_response(StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
        }
        Err(SubmitError::Storage(e)) => {
            log::error!("Failed to save score: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to save score", "details": e.to_string() }),
            )
        }
    }
}

fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}
