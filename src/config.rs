use crate::errors::AppError;
use crate::models::{Coordinates, QualityTier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When the secondary (free-text) source is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryPolicy {
    /// Always query every source.
    Always,
    /// Query the secondary source only when the primary yielded fewer than `min` leads.
    TopUp { min: usize },
}

/// Service-level configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub overpass_url: String,
    pub nominatim_url: String,
    pub hunter_base_url: String,
    pub hunter_api_key: Option<String>,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub overpass_max_results: usize,
    pub nominatim_max_results: usize,
    pub secondary_policy: SecondaryPolicy,
    pub enrich_batch_size: usize,
    pub enrich_batch_delay: Duration,
    pub dns_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            hunter_base_url: "https://api.hunter.io".to_string(),
            hunter_api_key: None,
            user_agent: "rust-lead-pipeline/0.1".to_string(),
            http_timeout: Duration::from_secs(20),
            overpass_max_results: 200,
            nominatim_max_results: 50,
            secondary_policy: SecondaryPolicy::TopUp { min: 20 },
            enrich_batch_size: 5,
            enrich_batch_delay: Duration::from_millis(500),
            dns_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let secondary_min = parse_positive("SECONDARY_SOURCE_MIN", 20)?;
        let secondary_policy = match std::env::var("SECONDARY_SOURCE_POLICY")
            .unwrap_or_else(|_| "top-up".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "always" => SecondaryPolicy::Always,
            "top-up" | "topup" => SecondaryPolicy::TopUp { min: secondary_min },
            other => anyhow::bail!(
                "SECONDARY_SOURCE_POLICY must be 'always' or 'top-up', got '{}'",
                other
            ),
        };

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            overpass_url: url_var("OVERPASS_URL", &defaults.overpass_url)?,
            nominatim_url: url_var("NOMINATIM_URL", &defaults.nominatim_url)?,
            hunter_base_url: url_var("HUNTER_BASE_URL", &defaults.hunter_base_url)?,
            hunter_api_key: std::env::var("HUNTER_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            user_agent: std::env::var("HTTP_USER_AGENT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            http_timeout: Duration::from_secs(parse_positive("HTTP_TIMEOUT_SECS", 20)? as u64),
            overpass_max_results: parse_positive("OVERPASS_MAX_RESULTS", 200)?,
            nominatim_max_results: parse_positive("NOMINATIM_MAX_RESULTS", 50)?,
            secondary_policy,
            enrich_batch_size: parse_positive("ENRICH_BATCH_SIZE", 5)?,
            enrich_batch_delay: Duration::from_millis(
                std::env::var("ENRICH_BATCH_DELAY_MS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("ENRICH_BATCH_DELAY_MS must be a number"))?,
            ),
            dns_timeout: Duration::from_secs(parse_positive("DNS_TIMEOUT_SECS", 5)? as u64),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Overpass URL: {}", config.overpass_url);
        tracing::debug!("Nominatim URL: {}", config.nominatim_url);
        tracing::debug!("Secondary source policy: {:?}", config.secondary_policy);
        if config.hunter_api_key.is_some() {
            tracing::info!("Email finder configured: {}", config.hunter_base_url);
        } else {
            tracing::info!("HUNTER_API_KEY not set, email discovery disabled");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

fn url_var(name: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(name).unwrap_or_else(|_| default.to_string());
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_positive(name: &str, default: usize) -> anyhow::Result<usize> {
    let value: usize = match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a positive number", name))?,
        Err(_) => default,
    };
    if value == 0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(value)
}

// ============ Run configuration ============

/// Centroid anchors for the supported countries: (name, ISO alpha-2, lat, lon).
pub const COUNTRY_ANCHORS: &[(&str, &str, f64, f64)] = &[
    ("india", "in", 20.5937, 78.9629),
    ("usa", "us", 37.0902, -95.7129),
    ("uk", "gb", 55.3781, -3.4360),
    ("canada", "ca", 56.1304, -106.3468),
    ("australia", "au", -25.2744, 133.7751),
    ("germany", "de", 51.1657, 10.4515),
    ("france", "fr", 46.2276, 2.2137),
    ("uae", "ae", 23.4241, 53.8478),
    ("singapore", "sg", 1.3521, 103.8198),
    ("japan", "jp", 36.2048, 138.2529),
    ("brazil", "br", -14.2350, -51.9253),
    ("mexico", "mx", 23.6345, -102.5528),
];

/// Finds a supported country by name or two-letter code.
pub fn lookup_country(country: &str) -> Option<(&'static str, &'static str, Coordinates)> {
    let needle = country.trim().to_lowercase();
    COUNTRY_ANCHORS
        .iter()
        .find(|(name, code, _, _)| *name == needle || *code == needle)
        .map(|(name, code, lat, lon)| (*name, *code, Coordinates::new(*lat, *lon)))
}

/// Caller-supplied run parameters, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RunConfigRequest {
    pub category: String,
    pub city: String,
    pub country: String,
    /// Explicit anchor; overrides the country centroid.
    pub anchor: Option<Coordinates>,
    pub quality: QualityTier,
    pub radius_km: f64,
    pub count: usize,
    pub contactable_only: bool,
    pub verified_only: bool,
    pub require_website: bool,
    pub min_rating: Option<f64>,
    pub validate: bool,
    pub enrich: bool,
    pub score: bool,
}

impl Default for RunConfigRequest {
    fn default() -> Self {
        Self {
            category: String::new(),
            city: String::new(),
            country: "india".to_string(),
            anchor: None,
            quality: QualityTier::High,
            radius_km: 15.0,
            count: 100,
            contactable_only: false,
            verified_only: false,
            require_website: false,
            min_rating: None,
            validate: false,
            enrich: false,
            score: true,
        }
    }
}

/// Immutable configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub category: String,
    pub city: String,
    /// Canonical country name, e.g. "india".
    pub country: String,
    /// ISO 3166-1 alpha-2, lowercase.
    pub country_code: String,
    pub anchor: Coordinates,
    pub quality: QualityTier,
    pub radius_km: f64,
    pub count: usize,
    pub contactable_only: bool,
    pub verified_only: bool,
    pub require_website: bool,
    pub min_rating: Option<f64>,
    pub validate: bool,
    pub enrich: bool,
    pub score: bool,
}

impl RunConfig {
    /// Validates a request; configuration errors reject the run before any stage executes.
    pub fn resolve(request: RunConfigRequest) -> Result<Self, AppError> {
        let category = request.category.trim().to_string();
        if category.is_empty() {
            return Err(AppError::BadRequest("category is required".to_string()));
        }
        let city = request.city.trim().to_string();
        if city.is_empty() {
            return Err(AppError::BadRequest("city is required".to_string()));
        }

        let known = lookup_country(&request.country);
        let (country, country_code, anchor) = match (known, request.anchor) {
            (Some((name, code, _)), Some(anchor)) => (name.to_string(), code.to_string(), anchor),
            (Some((name, code, centroid)), None) => {
                (name.to_string(), code.to_string(), centroid)
            }
            (None, Some(anchor)) if request.country.trim().len() == 2 => {
                let code = request.country.trim().to_lowercase();
                (code.clone(), code, anchor)
            }
            _ => {
                return Err(AppError::BadRequest(format!(
                    "unsupported country '{}' (supply a known country or an explicit anchor)",
                    request.country
                )))
            }
        };

        if !anchor.is_valid() {
            return Err(AppError::BadRequest(format!(
                "anchor out of range: ({}, {})",
                anchor.lat, anchor.lon
            )));
        }
        if !request.radius_km.is_finite() || request.radius_km <= 0.0 {
            return Err(AppError::BadRequest(
                "radius_km must be a positive number".to_string(),
            ));
        }
        if request.count == 0 {
            return Err(AppError::BadRequest(
                "count must be greater than zero".to_string(),
            ));
        }
        if let Some(min) = request.min_rating {
            if !(0.0..=5.0).contains(&min) {
                return Err(AppError::BadRequest(
                    "min_rating must be between 0 and 5".to_string(),
                ));
            }
        }

        Ok(Self {
            category,
            city,
            country,
            country_code,
            anchor,
            quality: request.quality,
            radius_km: request.radius_km,
            count: request.count,
            contactable_only: request.contactable_only,
            verified_only: request.verified_only,
            require_website: request.require_website,
            min_rating: request.min_rating,
            validate: request.validate,
            enrich: request.enrich,
            score: request.score,
        })
    }
}
