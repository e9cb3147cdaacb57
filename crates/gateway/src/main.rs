//! PrintTrack API Gateway
//!
//! HTTP entry point for the recipe catalog and job tracking.
//! Handles:
//! - Bulk recipe upload with per-row error reports
//! - Recipe search, lookup, creation and export
//! - Production jobs
//! - Observability (logging, metrics)

mod handlers;
mod imports;
mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use printtrack_common::{
    config::AppConfig,
    db::DbPool,
    metrics::{self, IMPORT_BUCKETS, METRICS_PREFIX},
    telemetry::init_tracing,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::imports::ImportTracker;
use crate::middleware::{
    rate_limit::{rate_limit_middleware, UploadLimiter},
    request_metrics::track_requests,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    /// Prometheus handle, `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
    /// Bulk imports still running
    pub imports: ImportTracker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting PrintTrack API Gateway v{}",
        printtrack_common::VERSION
    );

    let config = Arc::new(config);

    // Initialize metrics
    let metrics_handle = if config.observability.metrics_enabled {
        Some(install_prometheus()?)
    } else {
        None
    };
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Create app state
    let imports = ImportTracker::new();
    let state = AppState {
        config: config.clone(),
        db,
        metrics: metrics_handle,
        imports: imports.clone(),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.shutdown_timeout(), imports.clone()))
        .await?;

    if imports.active() > 0 {
        info!(running = imports.active(), "Waiting for bulk imports to finish");
        imports.wait_idle().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global Prometheus recorder
fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_import_duration_seconds", METRICS_PREFIX)),
            IMPORT_BUCKETS,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Bulk upload gets its own body limit and rate limit, and no request
    // timeout: the import runs to completion once started
    let mut upload_routes = Router::new()
        .route("/recipes/bulk-upload", post(handlers::recipes::bulk_upload))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes));

    if config.rate_limit.enabled {
        let limiter = UploadLimiter::new(&config.rate_limit);
        upload_routes = upload_routes.route_layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Recipe endpoints
        .route(
            "/recipes",
            get(handlers::recipes::search_recipes).post(handlers::recipes::create_recipe),
        )
        .route("/recipes/lookup", get(handlers::recipes::lookup_recipe))
        .route("/recipes/export", post(handlers::recipes::export_recipes))
        .route("/recipes/sample.csv", get(handlers::recipes::sample_csv))
        .route("/recipes/sample.xlsx", get(handlers::recipes::sample_xlsx))

        // Job endpoints
        .route(
            "/jobs",
            get(handlers::jobs::list_jobs).post(handlers::jobs::create_job),
        )
        .route("/jobs/{id}", get(handlers::jobs::get_job))
        .route("/jobs/{id}/status", post(handlers::jobs::update_status));

    let api_routes = with_request_timeout(api_routes, upload_routes, config.request_timeout());

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .route("/metrics", get(handlers::health::metrics))
        .route_layer(axum::middleware::from_fn(track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

/// Apply the request timeout to `timed` only, then merge in `untimed`
fn with_request_timeout<S>(timed: Router<S>, untimed: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    timed.layer(TimeoutLayer::new(timeout)).merge(untimed)
}

/// Graceful shutdown signal handler
async fn shutdown_signal(grace: Duration, imports: ImportTracker) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }

    // Requests get `grace` to finish. A running bulk import is never cut
    // short: the forced exit waits until every import is done.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        if imports.active() > 0 {
            warn!(running = imports.active(), "Grace period over, waiting for bulk imports");
            imports.wait_idle().await;
        }
        warn!(grace_secs = grace.as_secs(), "Requests still running after grace period, exiting");
        std::process::exit(1);
    });
}
