//! Health check endpoint.

use actix_web::{HttpResponse, web};
use blog_shared::dto::HealthResponse;

use crate::state::AppState;

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let status = match &state.db {
        Some(db) => database_status(db).await,
        None => "ok",
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(feature = "postgres")]
async fn database_status(db: &blog_infra::DatabaseConnections) -> &'static str {
    match db.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Database ping failed: {}", e);
            "degraded"
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_status(_db: &blog_infra::DatabaseConnections) -> &'static str {
    "ok"
}
