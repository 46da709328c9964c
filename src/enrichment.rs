/// Lead enrichment: company metadata, profile discovery, email discovery and
/// job-title extraction.
///
/// Leads are processed in fixed-size batches. Within a batch every lead is
/// enriched concurrently; the stage waits for the whole batch, then sleeps for
/// the configured delay before starting the next one. Each lookup is
/// best-effort: a failure leaves that lead's fields untouched and never
/// affects its siblings.
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::Lead;
use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Industry → keywords. Order matters: the first industry with a hit wins.
pub const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("saas", &["software", "cloud", "api", "platform"]),
    ("ecommerce", &["shop", "store", "sell", "product"]),
    ("agency", &["agency", "marketing", "creative", "design"]),
    ("finance", &["bank", "fintech", "payment", "crypto"]),
    ("healthcare", &["health", "medical", "clinic", "doctor"]),
];

/// Title keyword groups, checked in order: executive, technical, functional.
pub const TITLE_GROUPS: &[&[&str]] = &[
    &["CEO", "Founder", "President", "Director", "Manager", "Head of"],
    &["Developer", "Engineer", "Designer", "Analyst", "Specialist"],
    &["Sales", "Marketing", "Product", "Operations", "Finance"],
];

/// Title used when no keyword matches.
pub const DEFAULT_JOB_TITLE: &str = "Professional";

/// Longest company description kept, in characters.
const MAX_DESCRIPTION_CHARS: usize = 280;

static TITLE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    TITLE_GROUPS
        .iter()
        .map(|group| {
            let alternation = group
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("title regex is valid")
        })
        .collect()
});

/// First industry whose keywords appear in `text` (case-insensitive).
pub fn classify_industry(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    INDUSTRY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(industry, _)| *industry)
}

/// Keeps a known title; otherwise matches the title groups against the lead's text.
pub fn extract_job_title(lead: &Lead) -> String {
    if let Some(title) = lead.job_title.as_deref().filter(|t| !t.trim().is_empty()) {
        return title.to_string();
    }

    let text = [
        Some(lead.name.as_str()),
        lead.description.as_deref(),
        lead.company_description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    for (regex, group) in TITLE_REGEXES.iter().zip(TITLE_GROUPS) {
        if let Some(found) = regex.find(&text) {
            let matched = found.as_str().to_lowercase();
            if let Some(canonical) = group.iter().find(|t| t.to_lowercase() == matched) {
                return canonical.to_string();
            }
        }
    }

    DEFAULT_JOB_TITLE.to_string()
}

/// Registrable host of a website, without a leading `www.`.
pub fn website_domain(website: &str) -> Option<String> {
    let url = parse_website(website)?;
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

fn parse_website(website: &str) -> Option<url::Url> {
    let website = website.trim();
    if website.is_empty() {
        return None;
    }
    url::Url::parse(website)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .or_else(|| url::Url::parse(&format!("https://{}", website)).ok())
}

// ============ Provider seams ============

/// What a company website tells us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
}

/// An address found by a finder service.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundEmail {
    pub email: String,
    pub confidence: f64,
    pub source: String,
}

#[async_trait]
pub trait CompanyLookup: Send + Sync {
    async fn lookup_company(&self, website: &str) -> Result<CompanyProfile, AppError>;
}

#[async_trait]
pub trait ProfileFinder: Send + Sync {
    async fn find_profile(&self, name: &str, company: &str) -> Result<Option<String>, AppError>;
}

#[async_trait]
pub trait EmailFinder: Send + Sync {
    async fn find_email(&self, name: &str, domain: &str) -> Result<Option<FoundEmail>, AppError>;
}

// ============ Website inspector ============

static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).expect("valid selector"));
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).expect("valid selector"));
static OG_SITE_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:site_name"]"#).expect("valid selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));

/// Reads description, site name and industry from a company's homepage.
pub struct WebsiteInspector {
    client: Client,
}

impl WebsiteInspector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .map(String::from)
}

/// Extracts the company profile from a page's HTML.
pub fn parse_company_page(html: &str) -> CompanyProfile {
    let document = Html::parse_document(html);

    let description = meta_content(&document, &META_DESCRIPTION)
        .or_else(|| meta_content(&document, &OG_DESCRIPTION))
        .map(|d| d.chars().take(MAX_DESCRIPTION_CHARS).collect::<String>());

    let body_text = document
        .select(&BODY)
        .next()
        .map(|body| body.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let industry = classify_industry(&format!(
        "{} {}",
        body_text,
        description.as_deref().unwrap_or("")
    ))
    .map(String::from);

    CompanyProfile {
        name: meta_content(&document, &OG_SITE_NAME),
        description,
        industry,
    }
}

#[async_trait]
impl CompanyLookup for WebsiteInspector {
    async fn lookup_company(&self, website: &str) -> Result<CompanyProfile, AppError> {
        let url = parse_website(website)
            .ok_or_else(|| AppError::BadRequest(format!("Unusable website: {}", website)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Website fetch failed: {}", website))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Website {} returned status {}",
                website,
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .with_context(|| format!("Website body unreadable: {}", website))?;

        Ok(parse_company_page(&html))
    }
}

// ============ Profile discovery ============

/// Builds a people-search link for name + company.
pub struct LinkedInSearch {
    base_url: String,
}

impl Default for LinkedInSearch {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com/search/results/people/".to_string(),
        }
    }
}

#[async_trait]
impl ProfileFinder for LinkedInSearch {
    async fn find_profile(&self, name: &str, company: &str) -> Result<Option<String>, AppError> {
        let keywords = format!("{} {}", name.trim(), company.trim());
        let url = url::Url::parse_with_params(&self.base_url, &[("keywords", keywords.trim())])?;
        Ok(Some(url.to_string()))
    }
}

// ============ Email finder ============

#[derive(Debug, Deserialize)]
struct HunterResponse {
    data: Option<HunterData>,
}

#[derive(Debug, Deserialize)]
struct HunterData {
    email: Option<String>,
    #[serde(alias = "confidence")]
    score: Option<f64>,
}

/// Quota-limited email finder (Hunter-compatible API).
pub struct HunterClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HunterClient {
    /// Confidence assumed when the service omits a score.
    const DEFAULT_CONFIDENCE: f64 = 0.8;

    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl EmailFinder for HunterClient {
    async fn find_email(&self, name: &str, domain: &str) -> Result<Option<FoundEmail>, AppError> {
        let mut parts = name.split_whitespace();
        let mut params = vec![("domain", domain.to_string())];
        if let Some(first) = parts.next() {
            params.push(("first_name", first.to_string()));
        }
        if let Some(last) = parts.next() {
            params.push(("last_name", last.to_string()));
        }
        params.push(("api_key", self.api_key.clone()));

        // Redact key from logs
        tracing::debug!("Email finder lookup for domain {} (api_key=[REDACTED])", domain);

        let response = self
            .client
            .get(format!("{}/v2/email-finder", self.base_url))
            .query(&params)
            .send()
            .await
            .context("Email finder request failed")?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Email finder returned status {}",
                response.status()
            )));
        }

        let body: HunterResponse = response
            .json()
            .await
            .context("Failed to parse email finder response")?;

        Ok(body.data.and_then(|data| {
            let email = data.email.filter(|e| !e.trim().is_empty())?;
            let confidence = match data.score {
                Some(s) if s > 1.0 => (s / 100.0).min(1.0),
                Some(s) if s >= 0.0 => s,
                _ => Self::DEFAULT_CONFIDENCE,
            };
            Some(FoundEmail {
                email,
                confidence,
                source: "hunter.io".to_string(),
            })
        }))
    }
}

// ============ Enricher stage ============

/// Batch size and inter-batch delay.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_millis(500),
        }
    }
}

pub struct Enricher {
    company: Arc<dyn CompanyLookup>,
    profiles: Arc<dyn ProfileFinder>,
    emails: Option<Arc<dyn EmailFinder>>,
    settings: EnrichmentSettings,
}

impl Enricher {
    pub fn new(
        company: Arc<dyn CompanyLookup>,
        profiles: Arc<dyn ProfileFinder>,
        emails: Option<Arc<dyn EmailFinder>>,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            company,
            profiles,
            emails,
            settings,
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        let emails = config.hunter_api_key.as_ref().map(|key| {
            Arc::new(HunterClient::new(
                client.clone(),
                config.hunter_base_url.clone(),
                key.clone(),
            )) as Arc<dyn EmailFinder>
        });

        Self::new(
            Arc::new(WebsiteInspector::new(client)),
            Arc::new(LinkedInSearch::default()),
            emails,
            EnrichmentSettings {
                batch_size: config.enrich_batch_size,
                batch_delay: config.enrich_batch_delay,
            },
        )
    }

    /// Enriches every lead, preserving order.
    pub async fn enrich_leads(&self, leads: Vec<Lead>) -> Vec<Lead> {
        let total = leads.len();
        let batch_size = self.settings.batch_size.max(1);
        let mut enriched = Vec::with_capacity(total);
        let mut remaining = leads.into_iter();

        loop {
            let batch: Vec<Lead> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            tracing::debug!(
                "Enriching batch of {} ({}/{} done)",
                batch.len(),
                enriched.len(),
                total
            );
            let results = join_all(batch.into_iter().map(|lead| self.enrich_lead(lead))).await;
            enriched.extend(results);

            if enriched.len() < total && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        tracing::info!(
            "Enriched {} leads: {} with industry, {} with profile link",
            total,
            enriched.iter().filter(|l| l.industry.is_some()).count(),
            enriched.iter().filter(|l| l.linkedin.is_some()).count()
        );
        enriched
    }

    /// Enriches one lead. Each lookup that fails is logged and skipped.
    pub async fn enrich_lead(&self, mut lead: Lead) -> Lead {
        if let Some(website) = lead.website.clone().filter(|w| !w.trim().is_empty()) {
            match self.company.lookup_company(&website).await {
                Ok(profile) => {
                    if lead.company.is_none() {
                        lead.company = profile.name.or_else(|| Some(lead.name.clone()));
                    }
                    if profile.description.is_some() {
                        lead.company_description = profile.description;
                    }
                    if profile.industry.is_some() {
                        lead.industry = profile.industry;
                    }
                }
                Err(e) => tracing::warn!("Company lookup failed for '{}': {}", lead.name, e),
            }
        }

        if lead.linkedin.is_none() {
            if let Some(company) = lead.company.clone() {
                match self.profiles.find_profile(&lead.name, &company).await {
                    Ok(Some(profile)) => lead.linkedin = Some(profile),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Profile lookup failed for '{}': {}", lead.name, e),
                }
            }
        }

        if !lead.has_email() {
            let domain = lead.website.as_deref().and_then(website_domain);
            if let (Some(finder), Some(domain)) = (&self.emails, domain) {
                match finder.find_email(&lead.name, &domain).await {
                    Ok(Some(found)) => {
                        tracing::debug!("Discovered email for '{}' via {}", lead.name, found.source);
                        lead.email = Some(found.email);
                        lead.email_source = Some(found.source);
                        lead.email_confidence = Some(found.confidence);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Email discovery failed for '{}': {}", lead.name, e),
                }
            }
        }

        lead.job_title = Some(extract_job_title(&lead));
        lead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadSource;

    #[test]
    fn test_industry_table_order_is_significant() {
        // "software store" hits both saas and ecommerce; saas is listed first.
        assert_eq!(classify_industry("Software store downtown"), Some("saas"));
        assert_eq!(classify_industry("Family owned shop"), Some("ecommerce"));
        assert_eq!(classify_industry("Dental CLINIC"), Some("healthcare"));
        assert_eq!(classify_industry("Quiet bakery"), None);
    }

    #[test]
    fn test_job_title_groups() {
        let mut lead = Lead::new("Asha Rao, Founder", LeadSource::OpenStreetMap);
        assert_eq!(extract_job_title(&lead), "Founder");

        lead.name = "Rao Consulting".to_string();
        lead.description = Some("senior engineer and sales lead".to_string());
        assert_eq!(extract_job_title(&lead), "Engineer");

        lead.description = None;
        assert_eq!(extract_job_title(&lead), DEFAULT_JOB_TITLE);

        lead.job_title = Some("CTO".to_string());
        assert_eq!(extract_job_title(&lead), "CTO");
    }

    #[test]
    fn test_title_match_is_case_insensitive_and_canonical() {
        let lead = Lead::new("the ceo office", LeadSource::Nominatim);
        assert_eq!(extract_job_title(&lead), "CEO");
    }

    #[test]
    fn test_website_domain() {
        assert_eq!(
            website_domain("https://www.acme.io/about").as_deref(),
            Some("acme.io")
        );
        assert_eq!(website_domain("acme.io").as_deref(), Some("acme.io"));
        assert_eq!(website_domain(""), None);
    }

    #[test]
    fn test_parse_company_page() {
        let html = r#"<html><head>
            <meta property="og:site_name" content="Acme Cloud">
            <meta name="description" content="Payroll platform for small teams">
            </head><body><h1>Welcome</h1><p>We build software.</p></body></html>"#;
        let profile = parse_company_page(html);
        assert_eq!(profile.name.as_deref(), Some("Acme Cloud"));
        assert_eq!(
            profile.description.as_deref(),
            Some("Payroll platform for small teams")
        );
        assert_eq!(profile.industry.as_deref(), Some("saas"));
    }

    #[tokio::test]
    async fn test_profile_link_encodes_keywords() {
        let link = LinkedInSearch::default()
            .find_profile("Asha Rao", "Acme & Co")
            .await
            .unwrap()
            .unwrap();
        assert!(link.starts_with("https://www.linkedin.com/search/results/people/?keywords="));
        assert!(link.contains("Acme+%26+Co"));
    }
}
