//! Rutas HTTP
//!
//! Arma el router completo de la API con sus capas de traza y CORS.

pub mod alert_routes;
pub mod health_routes;
pub mod maintenance_routes;
pub mod ws_routes;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_for;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_for(&state.config.cors_origins);

    Router::new()
        .nest("/api/mantenciones", maintenance_routes::create_maintenance_router())
        .nest("/api/alertas", alert_routes::create_alert_router())
        .merge(ws_routes::create_ws_router())
        .merge(health_routes::create_health_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
