use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Circuit breaker type held by each source adapter.
pub type ProviderBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// When a provider's circuit opens and how long it stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    /// Consecutive failed fetches before the circuit opens.
    pub failure_threshold: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            min_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Creates a breaker for one upstream provider.
///
/// While open, fetches are rejected without a network call and the adapter
/// reports no leads. After the backoff a single trial call decides whether
/// the circuit closes again.
pub fn create_provider_circuit_breaker(settings: BreakerSettings) -> ProviderBreaker {
    let backoff_strategy = backoff::exponential(settings.min_backoff, settings.max_backoff);
    let failure_policy =
        failure_policy::consecutive_failures(settings.failure_threshold, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
