//! Rutas HTTP
//!
//! `create_router` arma la aplicación completa con sus capas (CORS, trazas).

pub mod car_routes;
pub mod payment_routes;
pub mod rental_routes;
pub mod user_routes;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::cors::cors_layer;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.is_development(), &state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/users", user_routes::create_user_router(state.clone()))
        .nest("/cars", car_routes::create_car_router())
        .nest("/rentals", rental_routes::create_rental_router(state.clone()))
        .nest("/payments", payment_routes::create_payment_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
