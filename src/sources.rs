//! Source adapters: connectors to the upstream geodata providers.
//!
//! Every adapter returns normalized [`Lead`]s or an empty list. Transport
//! errors, unparsable bodies and open circuits are logged here and never
//! reach the aggregator.

use crate::circuit_breaker::{create_provider_circuit_breaker, BreakerSettings, ProviderBreaker};
use crate::config::{Config, RunConfig};
use crate::errors::{AppError, ResultExt};
use crate::geo::{distance_from, BoundingBox};
use crate::models::{clamp_unit, Coordinates, Lead, LeadSource};
use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

/// Minimum usable name length, in characters.
pub const MIN_NAME_CHARS: usize = 3;

/// Category → OSM tag filters. Unlisted categories fall back to a name search.
pub const CATEGORY_TAGS: &[(&str, &[(&str, &str)])] = &[
    ("saas-founders", &[("office", "company"), ("office", "yes")]),
    ("plumbers", &[("shop", "plumbing"), ("craft", "plumber")]),
    ("electricians", &[("craft", "electrician"), ("shop", "electrical")]),
    ("restaurants", &[("amenity", "restaurant"), ("amenity", "cafe")]),
    ("salons", &[("shop", "hairdresser"), ("amenity", "salon")]),
    ("dentist", &[("amenity", "clinic"), ("healthcare", "dentist")]),
    (
        "doctor",
        &[("amenity", "clinic"), ("amenity", "doctors"), ("healthcare", "doctor")],
    ),
    ("consultants", &[("office", "yes"), ("office", "company")]),
    ("accountants", &[("office", "accountant")]),
    ("lawyers", &[("office", "lawyer")]),
    ("gyms", &[("leisure", "fitness_centre"), ("leisure", "gym")]),
    ("hotels", &[("tourism", "hotel"), ("amenity", "hotel")]),
];

/// Looks up the tag filters for a category (case-insensitive).
pub fn category_tags(category: &str) -> Option<&'static [(&'static str, &'static str)]> {
    let key = category.trim().to_lowercase();
    CATEGORY_TAGS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tags)| *tags)
}

/// A connector to one upstream provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provider tag stamped on every lead this adapter produces.
    fn source(&self) -> LeadSource;

    /// Fetches candidates around the run's anchor. Never fails: errors yield an empty list.
    async fn fetch(&self, run: &RunConfig) -> Vec<Lead>;
}

/// Builds the shared HTTP client used for provider calls.
pub fn build_http_client(config: &Config) -> Result<Client, AppError> {
    Client::builder()
        .timeout(config.http_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to create HTTP client: {}", e)))
}

// ============ Quality scoring ============

/// Presence checklist feeding [`quality_score`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualitySignals {
    pub has_email: bool,
    pub has_phone: bool,
    pub has_website: bool,
    pub has_address: bool,
    pub has_hours: bool,
}

/// Weighted completeness: email 30, phone 25, website 20, address 15, hours 10; /100, max 1.0.
pub fn quality_score(signals: QualitySignals) -> f64 {
    let mut points = 0u32;
    if signals.has_email {
        points += 30;
    }
    if signals.has_phone {
        points += 25;
    }
    if signals.has_website {
        points += 20;
    }
    if signals.has_address {
        points += 15;
    }
    if signals.has_hours {
        points += 10;
    }
    clamp_unit(points as f64 / 100.0)
}

fn usable_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (trimmed.chars().count() >= MIN_NAME_CHARS).then(|| trimmed.to_string())
}

fn first_tag(tags: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| tags.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(String::from)
}

/// Builds a lead from OSM-style tags. Returns `None` for unnamed or unlocated results.
fn lead_from_tags(
    source: LeadSource,
    name: &str,
    point: Coordinates,
    tags: &HashMap<String, String>,
    address: Option<String>,
    run: &RunConfig,
) -> Option<Lead> {
    let name = usable_name(name)?;
    let distance = distance_from(run.anchor, point)?;

    let email = first_tag(tags, &["email", "contact:email"]);
    let phone = first_tag(tags, &["phone", "contact:phone"]);
    let website = first_tag(tags, &["website", "contact:website", "url"]);
    let opening_hours = first_tag(tags, &["opening_hours"]);
    let street = first_tag(tags, &["addr:street"]);
    let city = first_tag(tags, &["addr:city"]);

    let signals = QualitySignals {
        has_email: email.is_some(),
        has_phone: phone.is_some(),
        has_website: website.is_some(),
        has_address: address.is_some() || street.is_some() || city.is_some(),
        has_hours: opening_hours.is_some(),
    };

    let address = address.or_else(|| match (&street, &city) {
        (Some(street), city) => Some(format!(
            "{}, {}",
            street,
            city.clone().unwrap_or_else(|| run.city.clone())
        )),
        (None, Some(city)) => Some(city.clone()),
        (None, None) => Some(run.city.clone()),
    });

    let mut lead = Lead::new(name, source)
        .with_distance(distance)
        .with_quality(quality_score(signals));
    lead.address = address;
    lead.email = email;
    lead.phone = phone;
    lead.website = website;
    lead.opening_hours = opening_hours;
    lead.verified = tags
        .get("verified")
        .is_some_and(|v| !v.trim().is_empty() && v.trim() != "no");
    lead.rating = tags
        .get("stars")
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 5.0));
    lead.description = first_tag(tags, &["description"]);
    Some(lead)
}

async fn guarded_fetch<F>(breaker: &ProviderBreaker, source: LeadSource, call: F) -> Vec<Lead>
where
    F: std::future::Future<Output = Result<Vec<Lead>, AppError>>,
{
    match breaker.call(call).await {
        Ok(leads) => {
            if leads.is_empty() {
                tracing::warn!("{} returned no usable results", source);
            } else {
                tracing::info!("{} returned {} candidates", source, leads.len());
            }
            leads
        }
        Err(failsafe::Error::Rejected) => {
            tracing::warn!("{} circuit open, skipping source", source);
            Vec::new()
        }
        Err(failsafe::Error::Inner(e)) => {
            tracing::warn!("{} fetch failed: {}", source, e);
            Vec::new()
        }
    }
}

// ============ Overpass (structured POI data) ============

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Coordinates>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl OverpassElement {
    fn point(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => self.center,
        }
    }
}

/// Queries OpenStreetMap points of interest inside the run's bounding box.
pub struct OverpassAdapter {
    client: Client,
    base_url: String,
    max_results: usize,
    breaker: ProviderBreaker,
}

impl OverpassAdapter {
    pub fn new(client: Client, base_url: impl Into<String>, max_results: usize) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            max_results,
            breaker: create_provider_circuit_breaker(BreakerSettings::default()),
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            client,
            config.overpass_url.clone(),
            config.overpass_max_results,
        )
    }

    /// Overpass QL for the run: one `nwr` clause per mapped tag, or a name regex fallback.
    pub fn build_query(&self, run: &RunConfig) -> String {
        let bbox = BoundingBox::around(run.anchor, run.radius_km).to_overpass();
        let clauses: Vec<String> = match category_tags(&run.category) {
            Some(tags) => tags
                .iter()
                .map(|(k, v)| format!("nwr[\"{}\"=\"{}\"]({});", k, v, bbox))
                .collect(),
            None => {
                let term: String = run
                    .category
                    .chars()
                    .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
                    .collect();
                vec![format!("nwr[\"name\"~\"{}\",i]({});", term.trim(), bbox)]
            }
        };
        format!(
            "[out:json][timeout:25];({});out center {};",
            clauses.join(""),
            self.max_results
        )
    }

    async fn try_fetch(&self, run: &RunConfig) -> Result<Vec<Lead>, AppError> {
        let query = self.build_query(run);
        tracing::debug!("Overpass query: {}", query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("data", query.as_str())])
            .send()
            .await
            .context("Overpass request failed")?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Overpass returned status {}",
                response.status()
            )));
        }

        let body: OverpassResponse = response
            .json()
            .await
            .context("Failed to parse Overpass response")?;

        Ok(body
            .elements
            .iter()
            .filter_map(|el| {
                let point = el.point()?;
                let name = el.tags.get("name")?;
                lead_from_tags(LeadSource::OpenStreetMap, name, point, &el.tags, None, run)
            })
            .take(self.max_results)
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for OverpassAdapter {
    fn source(&self) -> LeadSource {
        LeadSource::OpenStreetMap
    }

    async fn fetch(&self, run: &RunConfig) -> Vec<Lead> {
        guarded_fetch(&self.breaker, self.source(), self.try_fetch(run)).await
    }
}

// ============ Nominatim (free-text place search) ============

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    extratags: Option<HashMap<String, String>>,
}

/// Searches places by "category city" text within the run's country.
pub struct NominatimAdapter {
    client: Client,
    base_url: String,
    max_results: usize,
    breaker: ProviderBreaker,
}

impl NominatimAdapter {
    /// Results requested upstream; `max_results` caps what is kept.
    const REQUEST_LIMIT: usize = 100;

    pub fn new(client: Client, base_url: impl Into<String>, max_results: usize) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            max_results,
            breaker: create_provider_circuit_breaker(BreakerSettings::default()),
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            client,
            config.nominatim_url.clone(),
            config.nominatim_max_results,
        )
    }

    async fn try_fetch(&self, run: &RunConfig) -> Result<Vec<Lead>, AppError> {
        let q = format!("{} {}", run.category, run.city);
        let limit = Self::REQUEST_LIMIT.to_string();

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", q.as_str()),
                ("countrycodes", run.country_code.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await
            .context("Nominatim request failed")?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .context("Failed to parse Nominatim response")?;

        let empty = HashMap::new();
        Ok(places
            .iter()
            .filter_map(|place| {
                let lat = place.lat.trim().parse::<f64>().ok()?;
                let lon = place.lon.trim().parse::<f64>().ok()?;
                let name = place
                    .name
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| place.display_name.split(',').next())?;
                let address = Some(place.display_name.clone()).filter(|a| !a.trim().is_empty());
                lead_from_tags(
                    LeadSource::Nominatim,
                    name,
                    Coordinates::new(lat, lon),
                    place.extratags.as_ref().unwrap_or(&empty),
                    address,
                    run,
                )
            })
            .take(self.max_results)
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for NominatimAdapter {
    fn source(&self) -> LeadSource {
        LeadSource::Nominatim
    }

    async fn fetch(&self, run: &RunConfig) -> Vec<Lead> {
        guarded_fetch(&self.breaker, self.source(), self.try_fetch(run)).await
    }
}
