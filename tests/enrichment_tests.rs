/// Tests for the enrichment stage
/// Uses in-process fakes for the company, profile and email providers
use async_trait::async_trait;
use rust_lead_pipeline::enrichment::{
    CompanyLookup, CompanyProfile, EmailFinder, Enricher, EnrichmentSettings, FoundEmail,
    ProfileFinder, DEFAULT_JOB_TITLE,
};
use rust_lead_pipeline::errors::AppError;
use rust_lead_pipeline::models::{Lead, LeadSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Company lookup that fails for one website and tracks concurrency.
#[derive(Default)]
struct FakeCompanies {
    failing_site: Option<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl CompanyLookup for FakeCompanies {
    async fn lookup_company(&self, website: &str) -> Result<CompanyProfile, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_site.as_deref() == Some(website) {
            return Err(AppError::ExternalApiError(format!("{} timed out", website)));
        }
        Ok(CompanyProfile {
            name: None,
            description: Some("Cloud software studio".to_string()),
            industry: Some("saas".to_string()),
        })
    }
}

struct FakeProfiles;

#[async_trait]
impl ProfileFinder for FakeProfiles {
    async fn find_profile(&self, name: &str, _company: &str) -> Result<Option<String>, AppError> {
        Ok(Some(format!("https://profiles.example/{}", name.replace(' ', "-"))))
    }
}

struct FailingEmails;

#[async_trait]
impl EmailFinder for FailingEmails {
    async fn find_email(&self, _name: &str, _domain: &str) -> Result<Option<FoundEmail>, AppError> {
        Err(AppError::ExternalApiError("quota exhausted".to_string()))
    }
}

fn lead(i: usize) -> Lead {
    let mut lead = Lead::new(format!("Business {}", i), LeadSource::OpenStreetMap);
    lead.website = Some(format!("https://business{}.example", i));
    lead
}

fn enricher(companies: Arc<FakeCompanies>, batch_size: usize) -> Enricher {
    Enricher::new(
        companies,
        Arc::new(FakeProfiles),
        None,
        EnrichmentSettings {
            batch_size,
            batch_delay: Duration::ZERO,
        },
    )
}

#[tokio::test]
async fn test_one_failed_lookup_does_not_affect_siblings() {
    let companies = Arc::new(FakeCompanies {
        failing_site: Some("https://business3.example".to_string()),
        ..Default::default()
    });
    let leads: Vec<Lead> = (1..=7).map(lead).collect();

    let enriched = enricher(companies.clone(), 5).enrich_leads(leads).await;

    assert_eq!(enriched.len(), 7);
    assert_eq!(companies.calls.load(Ordering::SeqCst), 7);
    for (i, lead) in enriched.iter().enumerate() {
        assert_eq!(lead.name, format!("Business {}", i + 1));
        if i == 2 {
            assert_eq!(lead.industry, None);
            assert_eq!(lead.company, None);
            assert_eq!(lead.linkedin, None);
        } else {
            assert_eq!(lead.industry.as_deref(), Some("saas"));
            assert_eq!(lead.company.as_deref(), Some(lead.name.as_str()));
            assert!(lead.linkedin.is_some());
        }
        assert_eq!(lead.job_title.as_deref(), Some(DEFAULT_JOB_TITLE));
    }
}

#[tokio::test]
async fn test_concurrency_is_bounded_by_batch_size() {
    let companies = Arc::new(FakeCompanies::default());
    let leads: Vec<Lead> = (1..=12).map(lead).collect();

    let enriched = enricher(companies.clone(), 5).enrich_leads(leads).await;

    assert_eq!(enriched.len(), 12);
    assert!(companies.max_in_flight.load(Ordering::SeqCst) <= 5);
    assert!(companies.max_in_flight.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_batch_delay_is_applied_between_batches_only() {
    let companies = Arc::new(FakeCompanies::default());
    let enricher = Enricher::new(
        companies,
        Arc::new(FakeProfiles),
        None,
        EnrichmentSettings {
            batch_size: 2,
            batch_delay: Duration::from_millis(50),
        },
    );

    // 3 leads → 2 batches → exactly one delay.
    let started = std::time::Instant::now();
    let enriched = enricher.enrich_leads((1..=3).map(lead).collect()).await;
    let elapsed = started.elapsed();

    assert_eq!(enriched.len(), 3);
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_email_finder_failure_keeps_other_enrichment() {
    let enricher = Enricher::new(
        Arc::new(FakeCompanies::default()),
        Arc::new(FakeProfiles),
        Some(Arc::new(FailingEmails)),
        EnrichmentSettings::default(),
    );

    let mut input = lead(1);
    input.description = Some("Run by the founder herself".to_string());

    let enriched = enricher.enrich_lead(input).await;
    assert_eq!(enriched.email, None);
    assert_eq!(enriched.email_source, None);
    assert_eq!(enriched.industry.as_deref(), Some("saas"));
    assert_eq!(enriched.job_title.as_deref(), Some("Founder"));
}

#[tokio::test]
async fn test_leads_without_website_skip_company_lookup() {
    let companies = Arc::new(FakeCompanies::default());
    let enricher = enricher(companies.clone(), 5);

    let enriched = enricher
        .enrich_leads(vec![Lead::new("Street Vendor", LeadSource::Nominatim)])
        .await;

    assert_eq!(companies.calls.load(Ordering::SeqCst), 0);
    assert_eq!(enriched[0].company, None);
    assert_eq!(enriched[0].linkedin, None);
    assert_eq!(enriched[0].job_title.as_deref(), Some(DEFAULT_JOB_TITLE));
}

#[tokio::test]
async fn test_empty_input() {
    let enriched = enricher(Arc::new(FakeCompanies::default()), 5)
        .enrich_leads(Vec::new())
        .await;
    assert!(enriched.is_empty());
}
