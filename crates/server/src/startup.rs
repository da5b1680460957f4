use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, ServerConfig};
use dotenvy::dotenv;
use service::email::EmailService;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

/// Origin-specific CORS when `cors_origin` is set, permissive otherwise.
fn build_cors(server: &ServerConfig) -> CorsLayer {
    match server.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::very_permissive().allow_origin(origin),
        Some(Err(e)) => {
            warn!(error = %e, "invalid cors_origin; falling back to permissive CORS");
            CorsLayer::very_permissive()
        }
        None => CorsLayer::very_permissive(),
    }
}

fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", server.host, server.port).parse()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Connect, migrate and assemble the shared state plus router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.auto_migrate {
        models::db::migrate(&db).await?;
    }

    let email = EmailService::from_config(&cfg.mail)?;

    let state = AppState { db, email };
    Ok(routes::build_router(state, build_cors(&cfg.server), &cfg.server.frontend_dir))
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_env()?;
    common::env::ensure_env(&cfg.server.frontend_dir).await?;

    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting salemanager server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_combines_host_and_port() {
        let server = ServerConfig { host: "0.0.0.0".into(), port: 8080, ..Default::default() };
        assert_eq!(bind_addr(&server).unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn bind_addr_rejects_hostnames_it_cannot_parse() {
        let server = ServerConfig { host: "not a host".into(), ..Default::default() };
        assert!(bind_addr(&server).is_err());
    }
}
