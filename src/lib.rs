//! Lead Pipeline Library
//!
//! Aggregates business listings from geodata providers, removes duplicates,
//! filters, validates contact details, enriches with company data, scores
//! each lead for cold outreach and ranks the result.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Pipeline stages and domain types.
//! - `integrations`: Upstream provider connectors.
//! - `obs`: Observability and logging.
//! - `aggregator`: Runs source adapters in priority order.
//! - `analytics`: Run statistics.
//! - `circuit_breaker`: Circuit breaker for provider calls.
//! - `config`: Service and run configuration.
//! - `dedup`: Identity keys and deduplication.
//! - `enrichment`: Company, profile, email and job-title enrichment.
//! - `errors`: Error handling types.
//! - `export`: Flattened rows for external renderers.
//! - `filter`: Run-configured lead filters.
//! - `geo`: Distance and bounding-box math.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `pipeline`: Stage chaining and ranking.
//! - `scoring`: Cold-email scoring.
//! - `sources`: Overpass and Nominatim adapters.
//! - `validator`: Email and phone validation.

pub mod api;
pub mod core;
pub mod integrations;
pub mod obs;

// Re-export primary modules for shared use in tests and other binaries
pub mod aggregator;
pub mod analytics;
pub mod circuit_breaker;
pub mod config;
pub mod dedup;
pub mod enrichment;
pub mod errors;
pub mod export;
pub mod filter;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod sources;
pub mod validator;
