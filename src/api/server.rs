use crate::config::Settings;
use crate::database::RosterStore;
use crate::dns::ReconciliationEngine;
use actix_web::{web, App, HttpServer, middleware};
use std::sync::Arc;
use anyhow::Result;
use tera::Tera;
use tracing::{info, error, warn};

use crate::api::{handlers, render};

pub struct ApiState {
    pub engine: Arc<ReconciliationEngine>,
    pub roster: Arc<dyn RosterStore>,
    pub templates: Tera,
}

/// Console and JSON routes, shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/servers", web::get().to(handlers::console::servers_page))
        .route("/dns", web::get().to(handlers::console::dns_page))
        .route("/add", web::get().to(handlers::console::add))
        .route("/remove", web::get().to(handlers::console::remove))
        .service(
            web::scope("/api/v1")
                .route("/actions", web::get().to(handlers::console::list_actions))
                .route("/actions", web::post().to(handlers::console::apply_action))
                .route("/records", web::get().to(handlers::console::list_records))
                .route("/clusters", web::get().to(handlers::roster::list_clusters))
                .route("/servers", web::get().to(handlers::roster::list_servers))
                .route("/health", web::get().to(handlers::system::health)),
        );
}

pub async fn start(
    settings: Arc<Settings>,
    engine: Arc<ReconciliationEngine>,
    roster: Arc<dyn RosterStore>,
) -> Result<()> {
    let api_addr = format!("{}:{}", settings.api.bind_address, settings.api.port);

    info!("Starting console on {}", api_addr);

    let state = web::Data::new(ApiState {
        engine,
        roster,
        templates: render::templates()?,
    });

    let www_dir = settings.api.www_dir.clone();
    if !www_dir.is_dir() {
        warn!(
            "Static directory {} not found, serving pages without assets",
            www_dir.display()
        );
    }

    let server = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure);

        if www_dir.is_dir() {
            app = app.service(actix_files::Files::new("/", www_dir.clone()).index_file("index.html"));
        }

        app
    })
    .bind(&api_addr)?
    .run();

    info!("Console listening on {}", api_addr);

    match server.await {
        Ok(_) => {
            info!("Console shutdown gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Console server error: {}", e);
            Err(anyhow::anyhow!("Console server failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{ChangeApplier, PropagationPolicy, PublishedState};
    use crate::testing::{server, FakeProvider, FakeRoster};
    use actix_web::test;
    use std::time::Duration;

    async fn state(roster: FakeRoster) -> web::Data<ApiState> {
        let provider = Arc::new(
            FakeProvider::new().with_record("web.example.com", crate::dns::RecordType::A, 60, &["10.0.0.1"]),
        );
        let published = Arc::new(PublishedState::connect(provider, "example.com").await.unwrap());
        let policy = PropagationPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        };
        let applier = ChangeApplier::new(published.clone(), policy, 60);
        let roster: Arc<dyn RosterStore> = Arc::new(roster);

        web::Data::new(ApiState {
            engine: Arc::new(ReconciliationEngine::new(roster.clone(), published, applier)),
            roster,
            templates: render::templates().unwrap(),
        })
    }

    fn fleet() -> FakeRoster {
        FakeRoster::new(vec![
            server(1, "tsrv1", "10.0.0.1", "web"),
            server(2, "tsrv2", "10.0.0.2", "api"),
        ])
    }

    #[actix_web::test]
    async fn test_servers_page_lists_actions() {
        let app = test::init_service(App::new().app_data(state(fleet()).await).configure(configure)).await;

        let req = test::TestRequest::get().uri("/servers").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();

        assert!(html.contains("<td>tsrv1</td>"));
        assert!(html.contains("remove from rotation"));
        assert!(html.contains("<td>tsrv2</td>"));
        assert!(html.contains("add to rotation"));
    }

    #[actix_web::test]
    async fn test_dns_page_flags_unclaimed_addresses() {
        let app = test::init_service(
            App::new()
                .app_data(state(FakeRoster::new(Vec::new())).await)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/dns").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();

        assert!(html.contains("<td>web.example.com</td>"));
        assert!(html.contains(r#"class="flagged""#));
    }

    #[actix_web::test]
    async fn test_add_and_remove_reply_with_status_text() {
        let app = test::init_service(App::new().app_data(state(fleet()).await).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/add?name=tsrv2&domain=api.example.com&ip=10.0.0.2")
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "ADD_OK");

        let req = test::TestRequest::get()
            .uri("/remove?domain=api.example.com&ip=10.0.0.9")
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "DEL_ERROR");

        let req = test::TestRequest::get()
            .uri("/remove?domain=api.example.com&ip=10.0.0.2")
            .to_request();
        assert_eq!(test::call_and_read_body(&app, req).await, "DEL_OK");
    }

    #[actix_web::test]
    async fn test_json_apply_rejects_suspect_input() {
        let app = test::init_service(App::new().app_data(state(fleet()).await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/actions")
            .set_json(serde_json::json!({
                "kind": "add",
                "domain": "api.example.com/../x",
                "ip": "10.0.0.2"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_json_actions_listing() {
        let app = test::init_service(App::new().app_data(state(fleet()).await).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/v1/actions").to_request();
        let actions: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(actions[0]["kind"], "remove");
        assert_eq!(actions[0]["domain"], "web.example.com");
        assert_eq!(actions[1]["kind"], "add");
        assert_eq!(actions[1]["server_name"], "tsrv2");
    }

    #[actix_web::test]
    async fn test_roster_listings() {
        let app = test::init_service(App::new().app_data(state(fleet()).await).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/v1/servers?subdomains=api").to_request();
        let servers: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(servers.as_array().unwrap().len(), 1);
        assert_eq!(servers[0]["friendly_name"], "tsrv2");

        // An empty filter matches nothing rather than everything
        let req = test::TestRequest::get().uri("/api/v1/servers?subdomains=").to_request();
        let servers: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(servers.as_array().unwrap().is_empty());

        let req = test::TestRequest::get().uri("/api/v1/servers").to_request();
        let servers: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(servers.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/api/v1/clusters").to_request();
        let clusters: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(clusters.as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_health_reports_unreachable_database() {
        let mut roster = fleet();
        roster.unreachable = true;
        let app = test::init_service(App::new().app_data(state(roster).await).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let health: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(health["status"], "degraded");
        assert_eq!(health["database"], "unreachable");
        assert_eq!(health["zone"], "example.com");
    }
}
