mod orders;
mod webhook;

pub use orders::*;
pub use webhook::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/", get(get_order_details))
        .route("/create", post(create_order))
        .route("/verify", post(verify_payment))
        .route("/check-coupon", post(check_coupon))
        .route("/webhook", post(handle_webhook))
}
