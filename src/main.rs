use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod config;
mod db;
mod error;
mod handlers;
mod metrics;
mod models;
mod telemetry;

use crate::config::Config;
use crate::db::migrate::{self, MigrationOutcome};
use crate::metrics::Metrics;

const LISTEN_ADDR: &str = "0.0.0.0:8080";
const MIGRATIONS_DIR: &str = "migrations";

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub metrics: Arc<Metrics>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inventory_service=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env();
    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);

    info!(
        host = %config.db_host,
        port = %config.db_port,
        database = %config.db_name,
        "Connecting to PostgreSQL..."
    );
    let pool = db::connect(config.connect_options()?)
        .await
        .context("could not connect to the database")?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    match migrate::run_migrations(&pool, Path::new(MIGRATIONS_DIR), &metrics)
        .await
        .context("migration failed")?
    {
        MigrationOutcome::Applied(count) => info!(count, "Migrations applied successfully"),
        MigrationOutcome::NoChange => info!("Schema already up to date"),
    }

    let endpoint = telemetry::otlp_endpoint();
    let tracer = match telemetry::init_tracer(&endpoint) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!(
                error = %e,
                endpoint = %endpoint,
                "Tracing disabled: could not build OTLP exporter"
            );
            None
        }
    };

    let app = build_router(AppState { db: pool, metrics });

    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR)
        .await
        .with_context(|| format!("could not bind {LISTEN_ADDR}"))?;
    info!("Server running on http://{}", LISTEN_ADDR);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(provider) = tracer {
        telemetry::shutdown(provider).await;
    }
    info!("Server stopped.");

    Ok(())
}

fn build_router(state: AppState) -> Router {
    // ── Data routes: counted and timed per path ─────────────────────────────
    // route_layer keeps unmatched paths (404s) out of the `path` label.
    let data = Router::new()
        .route("/items", get(handlers::items::list_items))
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics::track_requests,
        ));

    Router::new()
        // ── Scrape endpoint (not counted) ───────────────────────────────────
        .route("/metrics", get(handlers::metrics::scrape))
        .merge(data)
        // ── Middleware ──────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections...");
}
