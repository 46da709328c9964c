use crate::analytics::LeadStats;
use crate::config::{Config, RunConfigRequest, COUNTRY_ANCHORS};
use crate::errors::AppError;
use crate::export::{export_rows, ExportRow};
use crate::pipeline::{run_pipeline, Pipeline, PipelineReport, RunOutcome};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Provider clients and stages, shared across runs.
    pub pipeline: Arc<Pipeline>,
}

/// Body returned by a lead search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub count: usize,
    pub leads: Vec<ExportRow>,
    pub stats: LeadStats,
}

impl From<PipelineReport> for SearchResponse {
    fn from(report: PipelineReport) -> Self {
        let leads = export_rows(&report.leads, &report.run, Utc::now());
        Self {
            run_id: report.run_id,
            outcome: report.outcome,
            count: leads.len(),
            stats: LeadStats::from_leads(&report.leads),
            leads,
        }
    }
}

/// Health check endpoint.
///
/// Reports the provider limits this instance runs with and whether email
/// discovery is configured. Credentials are never echoed.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let config = &state.config;
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-lead-pipeline",
            "version": env!("CARGO_PKG_VERSION"),
            "emailFinder": config.hunter_api_key.is_some(),
            "limits": {
                "overpassMaxResults": config.overpass_max_results,
                "nominatimMaxResults": config.nominatim_max_results,
                "enrichBatchSize": config.enrich_batch_size,
                "httpTimeoutSecs": config.http_timeout.as_secs()
            }
        })),
    )
}

/// GET /api/v1/countries
///
/// Lists the countries a run can be anchored to without an explicit anchor.
pub async fn list_countries() -> Json<serde_json::Value> {
    let countries: Vec<_> = COUNTRY_ANCHORS
        .iter()
        .map(|(name, code, lat, lon)| json!({ "name": name, "code": code, "lat": lat, "lon": lon }))
        .collect();
    Json(json!({ "countries": countries }))
}

/// POST /api/v1/leads/search
///
/// Runs the pipeline for one request and returns the ranked export rows.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The run parameters; omitted fields take their defaults.
///
/// # Returns
///
/// * `Result<Json<SearchResponse>, AppError>` - The ranked leads, or 400 for an invalid request.
pub async fn search_leads(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunConfigRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    tracing::info!(
        "POST /leads/search - category: {}, city: {}, country: {}",
        request.category,
        request.city,
        request.country
    );

    let report = run_pipeline(&state.pipeline, request).await?;
    if report.outcome == RunOutcome::NoResults {
        tracing::info!("Run {} found no leads", report.run_id);
    }

    Ok(Json(SearchResponse::from(report)))
}
