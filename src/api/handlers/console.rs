use actix_web::{web, HttpResponse};
use tracing::{error, info, trace};

use crate::api::models::{ActionQuery, ApplyResponse};
use crate::api::render::{self, TablePage, ERROR_PAGE};
use crate::api::server::ApiState;
use crate::dns::change_applier::ApplyOutcome;
use crate::dns::reconcile::{ActionKind, ActionRequest};
use crate::error::{KeeperError, Result};

/// Plain-text reply the console script shows in place of the action link.
pub fn outcome_text(kind: ActionKind, outcome: &Result<ApplyOutcome>) -> &'static str {
    match (kind, outcome) {
        (ActionKind::Add, Ok(_)) => "ADD_OK",
        (ActionKind::Add, Err(e)) if e.is_timeout() => "ADD_PENDING",
        (ActionKind::Add, Err(_)) => "ADD_ERROR",
        (ActionKind::Remove, Ok(_)) => "DEL_OK",
        (ActionKind::Remove, Err(e)) if e.is_timeout() => "DEL_PENDING",
        (ActionKind::Remove, Err(_)) => "DEL_ERROR",
    }
}

fn html(state: &ApiState, page: std::result::Result<TablePage, KeeperError>) -> HttpResponse {
    let rendered = page
        .map_err(|e| e.to_string())
        .and_then(|page| page.render(&state.templates).map_err(|e| e.to_string()));

    match rendered {
        Ok(body) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body),
        Err(e) => {
            error!(error = %e, "Page rendering failed");
            HttpResponse::InternalServerError()
                .content_type("text/html; charset=utf-8")
                .body(ERROR_PAGE)
        }
    }
}

pub async fn servers_page(state: web::Data<ApiState>) -> HttpResponse {
    trace!("Requested servers page");
    let actions = state.engine.compute_actions().await;
    html(&state, render::servers_page(&actions))
}

pub async fn dns_page(state: web::Data<ApiState>) -> HttpResponse {
    trace!("Requested DNS page");
    let rows = state.engine.published_listing().await;
    html(&state, render::dns_page(&rows))
}

async fn apply(state: &ApiState, request: ActionRequest) -> Result<ApplyOutcome> {
    info!(kind = ?request.kind, domain = %request.domain, ip = %request.ip, "Applying action");
    let outcome = state.engine.apply(&request).await;
    if let Err(e) = &outcome {
        error!(kind = ?request.kind, domain = %request.domain, ip = %request.ip, error = %e, "Action failed");
    }
    outcome
}

pub async fn add(state: web::Data<ApiState>, query: web::Query<ActionQuery>) -> HttpResponse {
    let query = query.into_inner();
    trace!(name = ?query.name, "API call (add)");
    let outcome = apply(&state, query.into_request(ActionKind::Add)).await;
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(outcome_text(ActionKind::Add, &outcome))
}

pub async fn remove(state: web::Data<ApiState>, query: web::Query<ActionQuery>) -> HttpResponse {
    let query = query.into_inner();
    trace!(name = ?query.name, "API call (remove)");
    let outcome = apply(&state, query.into_request(ActionKind::Remove)).await;
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(outcome_text(ActionKind::Remove, &outcome))
}

pub async fn list_actions(state: web::Data<ApiState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.compute_actions().await)
}

pub async fn list_records(state: web::Data<ApiState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.published_listing().await)
}

pub async fn apply_action(
    state: web::Data<ApiState>,
    req: web::Json<ActionRequest>,
) -> HttpResponse {
    let request = req.into_inner();
    let kind = request.kind;
    let outcome = apply(&state, request).await;

    let response = ApplyResponse {
        status: outcome_text(kind, &outcome).to_string(),
        message: outcome.as_ref().err().map(|e| e.to_string()),
    };

    match &outcome {
        Ok(_) => HttpResponse::Ok().json(response),
        Err(KeeperError::Validation(_)) => HttpResponse::BadRequest().json(response),
        Err(KeeperError::NotPresent { .. }) => HttpResponse::NotFound().json(response),
        Err(e) if e.is_timeout() => HttpResponse::Accepted().json(response),
        Err(_) => HttpResponse::BadGateway().json(response),
    }
}
