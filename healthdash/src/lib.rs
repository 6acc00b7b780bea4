//! # healthdash: a small self-hosted health metrics dashboard
//!
//! `healthdash` records one value per tracked metric per day (resting heart rate, sleep, mood
//! and so on), lets you correct values inline in a table, and charts everything it has
//! recorded along with the pairwise correlations between metrics.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses a single SQLite database file for persistence. Pages are rendered on the server; the
//! only client-side code is a small script that commits edits from the entries table.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) holds the route handlers and the request/response models they
//! exchange. Handlers validate input, call into a repository, and either render a page, return
//! a JSON status, or redirect.
//!
//! The **database layer** ([`db`]) uses the repository pattern to abstract data access over a
//! borrowed connection or transaction.
//!
//! The **analysis layer** ([`analysis`]) turns the stored entries into chart figures and
//! correlation coefficients. It is pure and does no I/O.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use healthdash::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = healthdash::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     healthdash::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod analysis;
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod static_assets;
pub mod telemetry;
pub mod templates;
#[cfg(test)]
pub mod test_utils;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
pub use templates::Templates;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};

/// Application state shared across all request handlers.
///
/// - `db`: SQLite connection pool
/// - `config`: Application configuration, including the metric catalogue
/// - `templates`: Parsed page templates
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub templates: Templates,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the connection pool, creating the database file if it does not exist yet.
#[instrument(skip_all, fields(url = %config.database.url))]
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(options)
        .await?;

    info!("Connected to database");
    Ok(pool)
}

/// Build the application router with all routes and middleware.
///
/// When `enable_metrics` is set, request metrics are collected and exposed at
/// `/internal/metrics`.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(api::handlers::index))
        .route("/entries", get(api::handlers::entries::list_entries))
        .route("/update_entry/{entry_id}", post(api::handlers::entries::update_entry))
        .route("/delete/{entry_id}", post(api::handlers::entries::delete_entry))
        .route("/form", get(api::handlers::form::get_form).post(api::handlers::form::submit_form))
        .route("/analysis", get(api::handlers::analysis::get_analysis))
        .route("/static/{*path}", get(api::handlers::static_assets::serve_embedded_asset))
        .route("/healthz", get(|| async { "OK" }))
        .with_state(state.clone());

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route(
                "/internal/metrics",
                get(move || {
                    let metric_handle = metric_handle.clone();
                    async move { metric_handle.render() }
                }),
            )
            .layer(prometheus_layer);
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The assembled server: router, configuration and the pool it owns.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance, connecting to the configured database
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting healthdash with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool).await
    }

    /// Create a new application instance on an existing pool. Migrations are applied first.
    pub async fn new_with_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .templates(Templates::new()?)
            .build();

        let router = build_router(&app_state);

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "healthdash listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[sqlx::test]
    #[test_log::test]
    async fn test_application_integration(pool: SqlitePool) {
        let server = Application::new_with_pool(create_test_config(), pool)
            .await
            .expect("Failed to create application")
            .into_test_server();

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_index_redirects_to_analysis(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/analysis");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_build_router_with_metrics_disabled(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/internal/metrics").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(!response.text().contains("# TYPE"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_build_router_with_metrics_enabled(pool: SqlitePool) {
        let mut config = create_test_config();
        config.enable_metrics = true;
        let server = Application::new_with_pool(config, pool)
            .await
            .expect("Failed to create application")
            .into_test_server();

        server.get("/healthz").await.assert_status_ok();

        let response = server.get("/internal/metrics").await;
        response.assert_status_ok();
        let metrics_content = response.text();
        assert!(metrics_content.contains("# HELP") || metrics_content.contains("# TYPE"));
    }

    #[test_log::test(tokio::test)]
    async fn test_setup_database_creates_schema() {
        let mut config = create_test_config();
        config.database.url = "sqlite::memory:".to_string();
        config.database.max_connections = 1;

        let app = Application::new(config).await.expect("Failed to create application");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metric_entries")
            .fetch_one(&app.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
