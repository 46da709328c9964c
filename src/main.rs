use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use rust_lead_pipeline::config::Config;
use rust_lead_pipeline::handlers::{self, AppState};
use rust_lead_pipeline::obs;
use rust_lead_pipeline::pipeline::Pipeline;

/// Main entry point for the lead search service.
///
/// Initializes tracing and configuration, wires the pipeline (source
/// adapters, validator, enricher) and starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing(obs::DEFAULT_FILTER);

    let config = Config::from_env()?;

    let pipeline = Pipeline::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build pipeline: {}", e))?;
    tracing::info!(
        "Pipeline ready (enrichment batches of {}, {:?} apart)",
        config.enrich_batch_size,
        config.enrich_batch_delay
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        pipeline: Arc::new(pipeline),
    });

    // Searches fan out to several providers; keep the per-IP rate low.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        .route("/api/v1/countries", get(handlers::list_countries))
        .route("/api/v1/leads/search", post(handlers::search_leads))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 64KB is plenty for a run request
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // SmartIpKeyExtractor falls back to the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
