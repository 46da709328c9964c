//! Stage chaining: aggregate → dedupe → filter → validate → enrich → score → rank.
//!
//! Every stage takes the previous stage's leads by value and returns new ones.
//! Nothing is shared between runs except the provider clients and the MX cache.

use crate::aggregator::Aggregator;
use crate::config::{Config, RunConfig, RunConfigRequest};
use crate::dedup::dedupe;
use crate::enrichment::Enricher;
use crate::errors::AppError;
use crate::filter::filter;
use crate::models::Lead;
use crate::scoring::score_for_cold_email;
use crate::sources::{build_http_client, NominatimAdapter, OverpassAdapter};
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// How a run ended. An empty result is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Ranked,
    NoResults,
}

/// Everything one pipeline invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub run: RunConfig,
    pub started_at: DateTime<Utc>,
    pub leads: Vec<Lead>,
}

pub struct Pipeline {
    aggregator: Aggregator,
    validator: Validator,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(aggregator: Aggregator, validator: Validator, enricher: Enricher) -> Self {
        Self {
            aggregator,
            validator,
            enricher,
        }
    }

    /// Wires the production adapters and providers from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config)?;

        let aggregator = Aggregator::new(
            Arc::new(OverpassAdapter::from_config(config, client.clone())),
            config.secondary_policy,
        )
        .with_secondary(Arc::new(NominatimAdapter::from_config(
            config,
            client.clone(),
        )));

        Ok(Self::new(
            aggregator,
            Validator::from_config(config),
            Enricher::from_config(config, client),
        ))
    }

    /// Runs every stage for one resolved configuration.
    pub async fn run(&self, run: &RunConfig) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = tracing::info_span!(
            "pipeline",
            %run_id,
            category = %run.category,
            city = %run.city
        );

        let leads = self.execute(run).instrument(span).await;
        let outcome = if leads.is_empty() {
            RunOutcome::NoResults
        } else {
            RunOutcome::Ranked
        };

        PipelineReport {
            run_id,
            outcome,
            run: run.clone(),
            started_at,
            leads,
        }
    }

    async fn execute(&self, run: &RunConfig) -> Vec<Lead> {
        tracing::info!(
            "Starting run: {} in {}, {} (radius {} km, count {})",
            run.category,
            run.city,
            run.country,
            run.radius_km,
            run.count
        );

        let candidates = self.aggregator.aggregate(run).await;
        if candidates.is_empty() {
            tracing::warn!("No source yielded candidates");
            return Vec::new();
        }

        let mut leads = filter(dedupe(candidates), run);

        if run.validate && !leads.is_empty() {
            leads = self.validator.validate_leads(leads, run).await;
        }
        if run.enrich && !leads.is_empty() {
            // Discovered emails change identity keys; collapse new collisions
            // and refresh fingerprints.
            leads = dedupe(self.enricher.enrich_leads(leads).await);
        }
        if run.score {
            leads = score_for_cold_email(leads);
        }

        let ranked = rank(leads, run.count);
        tracing::info!("Run finished with {} leads", ranked.len());
        ranked
    }
}

/// Stable sort by `cold_email_score` descending, then truncate to `count`.
pub fn rank(mut leads: Vec<Lead>, count: usize) -> Vec<Lead> {
    // `sort_by` is stable: equal scores keep their upstream order.
    leads.sort_by(|a, b| b.cold_email_score.total_cmp(&a.cold_email_score));
    leads.truncate(count);
    leads
}

/// Resolves a raw request and runs the pipeline. Only configuration errors are returned.
pub async fn run_pipeline(
    pipeline: &Pipeline,
    request: RunConfigRequest,
) -> Result<PipelineReport, AppError> {
    let run = RunConfig::resolve(request)?;
    Ok(pipeline.run(&run).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadSource;

    fn scored(name: &str, score: f64) -> Lead {
        let mut lead = Lead::new(name, LeadSource::OpenStreetMap);
        lead.cold_email_score = score;
        lead
    }

    #[test]
    fn test_rank_is_stable_for_equal_scores() {
        let leads = vec![
            scored("first", 5.0),
            scored("top", 9.0),
            scored("second", 5.0),
            scored("third", 5.0),
        ];
        let names: Vec<_> = rank(leads, 10).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_rank_truncates_after_sorting() {
        let leads = vec![scored("low", 1.0), scored("mid", 5.0), scored("high", 9.0)];
        let names: Vec<_> = rank(leads, 2).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["high", "mid"]);
    }
}
