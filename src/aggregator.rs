use crate::config::{RunConfig, SecondaryPolicy};
use crate::models::Lead;
use crate::sources::SourceAdapter;
use std::sync::Arc;

/// Runs the source adapters in priority order and concatenates their output.
///
/// The primary adapter is always queried. Secondary adapters are queried
/// according to [`SecondaryPolicy`]. Output order is primary first, then each
/// secondary in registration order, which later decides dedup priority.
pub struct Aggregator {
    primary: Arc<dyn SourceAdapter>,
    secondary: Vec<Arc<dyn SourceAdapter>>,
    policy: SecondaryPolicy,
}

impl Aggregator {
    pub fn new(primary: Arc<dyn SourceAdapter>, policy: SecondaryPolicy) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
            policy,
        }
    }

    pub fn with_secondary(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.secondary.push(adapter);
        self
    }

    pub async fn aggregate(&self, run: &RunConfig) -> Vec<Lead> {
        let mut leads = self.primary.fetch(run).await;
        let primary_count = leads.len();

        let query_secondary = match self.policy {
            SecondaryPolicy::Always => true,
            SecondaryPolicy::TopUp { min } => primary_count < min,
        };

        if !query_secondary {
            tracing::info!(
                "Primary source {} yielded {} candidates, skipping secondary sources",
                self.primary.source(),
                primary_count
            );
            return leads;
        }

        for adapter in &self.secondary {
            let batch = adapter.fetch(run).await;
            tracing::debug!("{} contributed {} candidates", adapter.source(), batch.len());
            leads.extend(batch);
        }

        tracing::info!(
            "Aggregated {} candidates ({} from primary)",
            leads.len(),
            primary_count
        );
        leads
    }
}
