//! Health check endpoints.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::Warehouse;

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Readiness check response.
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    status: &'static str,
    warehouse: &'static str,
}

/// Health check endpoint.
///
/// Returns 200 if the service is running.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check endpoint.
///
/// Opens a fresh warehouse connection and runs `SELECT 1`.
#[utoipa::path(
    get,
    path = "/api/v1/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Warehouse reachable", body = ReadyResponse),
        (status = 503, description = "Warehouse unreachable", body = crate::error::ErrorResponse)
    )
)]
#[get("/ready")]
pub async fn ready(warehouse: web::Data<Warehouse>) -> HttpResponse {
    match warehouse.ping().await {
        Ok(()) => HttpResponse::Ok().json(ReadyResponse {
            status: "ready",
            warehouse: "connected",
        }),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(crate::error::ErrorResponse {
                error: "NOT_READY".to_string(),
                message: "Warehouse connection failed".to_string(),
            })
        }
    }
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
