use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::warn;

use crate::api::server::ApiState;
use crate::error::KeeperError;

#[derive(Debug, Deserialize)]
pub struct ServersQuery {
    /// Comma-separated subdomains
    pub subdomains: Option<String>,
}

fn unavailable(e: KeeperError) -> HttpResponse {
    warn!(error = %e, "Roster unavailable");
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "error": "roster_unavailable",
        "message": e.to_string()
    }))
}

pub async fn list_clusters(state: web::Data<ApiState>) -> HttpResponse {
    match state.roster.list_clusters().await {
        Ok(clusters) => HttpResponse::Ok().json(clusters),
        Err(e) => unavailable(e),
    }
}

pub async fn list_servers(
    state: web::Data<ApiState>,
    query: web::Query<ServersQuery>,
) -> HttpResponse {
    let servers = match &query.subdomains {
        Some(list) => {
            let subdomains: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            state.roster.list_servers_by_subdomains(&subdomains).await
        }
        None => state.roster.list_servers(None, None).await,
    };

    match servers {
        Ok(servers) => HttpResponse::Ok().json(servers),
        Err(e) => unavailable(e),
    }
}
