use crate::config::RunConfig;
use crate::dedup::fingerprint;
use crate::models::{Lead, LeadSource, OutreachPriority, Validity};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Flattened lead handed to external renderers (CSV, spreadsheet rows, JSON).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub fingerprint: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub linkedin: Option<String>,
    pub source: LeadSource,
    /// `quality_score` as a whole percentage.
    pub quality_pct: u32,
    pub cold_email_score: f64,
    pub priority: Option<OutreachPriority>,
    pub email_valid: Validity,
    pub phone_valid: Validity,
    pub verified: bool,
    pub industry: Option<String>,
    pub distance_km: f64,
    pub country: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl ExportRow {
    pub fn from_lead(lead: &Lead, run: &RunConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint: lead
                .fingerprint
                .clone()
                .unwrap_or_else(|| fingerprint(lead)),
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone_e164.clone().or_else(|| lead.phone.clone()),
            website: lead.website.clone(),
            address: lead.address.clone(),
            company: lead.company.clone(),
            job_title: lead.job_title.clone(),
            linkedin: lead.linkedin.clone(),
            source: lead.source,
            quality_pct: (lead.quality_score * 100.0).round() as u32,
            cold_email_score: lead.cold_email_score,
            priority: lead.outreach_priority,
            email_valid: lead.email_valid,
            phone_valid: lead.phone_valid,
            verified: lead.verified,
            industry: lead.industry.clone(),
            distance_km: lead.distance_km,
            country: run.country.clone(),
            category: run.category.clone(),
            created_at,
        }
    }
}

/// Export rows for a ranked result set, all stamped with the same timestamp.
pub fn export_rows(leads: &[Lead], run: &RunConfig, created_at: DateTime<Utc>) -> Vec<ExportRow> {
    leads
        .iter()
        .map(|lead| ExportRow::from_lead(lead, run, created_at))
        .collect()
}
