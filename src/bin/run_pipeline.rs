//! One-shot pipeline run: reads a run request as JSON from a file path (first
//! argument) or stdin and prints the search response JSON to stdout.

use anyhow::Context;
use rust_lead_pipeline::config::{Config, RunConfigRequest};
use rust_lead_pipeline::handlers::SearchResponse;
use rust_lead_pipeline::obs;
use rust_lead_pipeline::pipeline::{run_pipeline, Pipeline};
use std::io::Read;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing("rust_lead_pipeline=info");

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let request: RunConfigRequest =
        serde_json::from_str(&raw).context("Request is not a valid run configuration")?;

    let config = Config::from_env()?;
    let pipeline = Pipeline::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to build pipeline: {}", e))?;

    let report = run_pipeline(&pipeline, request)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let response = SearchResponse::from(report);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
