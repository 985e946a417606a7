use actix_web::{web, HttpResponse};
use crate::api::models::HealthResponse;
use crate::api::server::ApiState;
use chrono::Utc;
use tracing::warn;

pub async fn health(
    state: web::Data<ApiState>,
) -> HttpResponse {
    let database = match state.roster.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            warn!(error = %e, "Health check: database unreachable");
            "unreachable"
        }
    };

    let response = HealthResponse {
        status: if database == "healthy" { "healthy" } else { "degraded" }.to_string(),
        database: database.to_string(),
        zone: state.engine.zone_apex().to_string(),
        timestamp: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}
