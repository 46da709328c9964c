use crate::models::{Lead, OutreachPriority, Validity};

/// Industries worth the high-value bonus.
pub const HIGH_VALUE_INDUSTRIES: &[&str] = &["saas", "tech", "finance", "ecommerce"];

/// Title fragments that mark a decision maker (case-insensitive).
pub const DECISION_MAKER_TITLES: &[&str] = &["ceo", "founder", "director", "manager"];

/// Maximum normalized score.
pub const MAX_SCORE: f64 = 10.0;

/// One weighted rule of the cold-email score.
pub struct ScoreRule {
    pub label: &'static str,
    pub points: u32,
    applies: fn(&Lead) -> bool,
}

impl ScoreRule {
    pub fn applies(&self, lead: &Lead) -> bool {
        (self.applies)(lead)
    }
}

fn valid_email(lead: &Lead) -> bool {
    lead.email_valid == Validity::Valid
}

fn unverified_email(lead: &Lead) -> bool {
    lead.email_valid != Validity::Valid && lead.has_email()
}

fn valid_phone(lead: &Lead) -> bool {
    lead.phone_valid == Validity::Valid
}

fn has_profile(lead: &Lead) -> bool {
    lead.linkedin.as_deref().is_some_and(|l| !l.trim().is_empty())
}

/// Any non-blank title counts, including the enricher's placeholder.
fn known_title(lead: &Lead) -> Option<&str> {
    lead.job_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn is_decision_maker(title: &str) -> bool {
    let title = title.to_lowercase();
    DECISION_MAKER_TITLES.iter().any(|t| title.contains(t))
}

fn decision_maker(lead: &Lead) -> bool {
    known_title(lead).is_some_and(is_decision_maker)
}

fn other_title(lead: &Lead) -> bool {
    known_title(lead).is_some_and(|t| !is_decision_maker(t))
}

fn has_company(lead: &Lead) -> bool {
    lead.company.as_deref().is_some_and(|c| !c.trim().is_empty())
}

fn professional_website(lead: &Lead) -> bool {
    lead.has_website() && lead.quality_score >= 0.8
}

fn trusted_business(lead: &Lead) -> bool {
    lead.verified || lead.rating.is_some_and(|r| r >= 4.0)
}

fn high_value_industry(lead: &Lead) -> bool {
    lead.industry
        .as_deref()
        .is_some_and(|i| HIGH_VALUE_INDUSTRIES.contains(&i.trim().to_lowercase().as_str()))
}

fn has_hours(lead: &Lead) -> bool {
    lead.opening_hours.as_deref().is_some_and(|h| !h.trim().is_empty())
}

fn nearby(lead: &Lead) -> bool {
    lead.distance_km < 5.0
}

/// Rules in evaluation order; `score_factors` follows this order.
pub const SCORE_RULES: &[ScoreRule] = &[
    ScoreRule { label: "Valid Email", points: 20, applies: valid_email },
    ScoreRule { label: "Unverified Email", points: 10, applies: unverified_email },
    ScoreRule { label: "Valid Phone", points: 10, applies: valid_phone },
    ScoreRule { label: "LinkedIn Profile", points: 10, applies: has_profile },
    ScoreRule { label: "Decision Maker", points: 8, applies: decision_maker },
    ScoreRule { label: "Job Title Known", points: 4, applies: other_title },
    ScoreRule { label: "Company Info", points: 3, applies: has_company },
    ScoreRule { label: "Professional Website", points: 10, applies: professional_website },
    ScoreRule { label: "Verified Business", points: 8, applies: trusted_business },
    ScoreRule { label: "High-Value Industry", points: 7, applies: high_value_industry },
    ScoreRule { label: "Active Hours Listed", points: 5, applies: has_hours },
    ScoreRule { label: "Local (Nearby)", points: 5, applies: nearby },
];

/// Score breakdown for one lead.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadScore {
    pub raw_points: u32,
    pub score: f64,
    pub factors: Vec<String>,
}

/// Evaluates every rule against `lead`.
pub fn score_lead(lead: &Lead) -> LeadScore {
    let matched: Vec<&ScoreRule> = SCORE_RULES.iter().filter(|r| r.applies(lead)).collect();
    let raw_points: u32 = matched.iter().map(|r| r.points).sum();
    LeadScore {
        raw_points,
        score: normalize(raw_points),
        factors: matched.iter().map(|r| r.label.to_string()).collect(),
    }
}

/// `min(raw / 100 * 10, 10)`, rounded to two decimals.
pub fn normalize(raw_points: u32) -> f64 {
    let scaled = (raw_points as f64 / 100.0 * MAX_SCORE).min(MAX_SCORE);
    (scaled * 100.0).round() / 100.0
}

pub fn priority_for(score: f64) -> OutreachPriority {
    if score >= 8.5 {
        OutreachPriority::Urgent
    } else if score >= 7.0 {
        OutreachPriority::High
    } else if score >= 5.5 {
        OutreachPriority::Medium
    } else {
        OutreachPriority::Low
    }
}

/// Step table from normalized score to expected reply rate.
pub fn response_likelihood(score: f64) -> f64 {
    match score {
        s if s >= 8.5 => 0.25,
        s if s >= 7.5 => 0.18,
        s if s >= 6.5 => 0.12,
        s if s >= 5.5 => 0.08,
        _ => 0.03,
    }
}

/// Attaches score, factors, priority and response likelihood to every lead.
pub fn score_for_cold_email(leads: Vec<Lead>) -> Vec<Lead> {
    let scored: Vec<Lead> = leads
        .into_iter()
        .map(|mut lead| {
            let breakdown = score_lead(&lead);
            lead.cold_email_score = breakdown.score;
            lead.score_factors = breakdown.factors;
            lead.outreach_priority = Some(priority_for(breakdown.score));
            lead.response_likelihood = response_likelihood(breakdown.score);
            lead
        })
        .collect();

    tracing::info!(
        "Scored {} leads ({} urgent, {} high)",
        scored.len(),
        scored
            .iter()
            .filter(|l| l.outreach_priority == Some(OutreachPriority::Urgent))
            .count(),
        scored
            .iter()
            .filter(|l| l.outreach_priority == Some(OutreachPriority::High))
            .count()
    );
    scored
}
