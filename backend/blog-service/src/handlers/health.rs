use crate::services::BlogActions;
use actix_web::{web, HttpResponse};
use tracing::warn;

/// Liveness plus a database round trip
pub async fn health_check(actions: web::Data<BlogActions>) -> HttpResponse {
    match actions.store().ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "up",
        })),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "database": "down",
            }))
        }
    }
}

/// Prometheus text exposition of every registered metric
pub async fn serve_metrics() -> HttpResponse {
    match db_pool::gather_metrics() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
