use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::auth::Authorized;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/time", get(time))
        .route("/version", get(version))
}

async fn health() -> &'static str {
    "ok"
}

/// Server UTC clock; behind the gate so deployments can probe authorization.
async fn time(_auth: Authorized) -> Json<Value> {
    info!("Calling GetTime");
    let now = Utc::now().format("%y/%m/%d-%H:%M:%S").to_string();
    Json(json!({ "time": now }))
}

async fn version(State(state): State<AppState>) -> Json<Value> {
    info!("Calling GetVersion");
    Json(json!({ "version": state.config.app_version }))
}
