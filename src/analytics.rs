use crate::models::Lead;
use crate::scoring::priority_for;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Base value of one lead before the score multiplier.
pub const BASE_LEAD_VALUE: f64 = 50.0;

/// Minimum score for [`priority_leads`].
pub const PRIORITY_MIN_SCORE: f64 = 7.0;

fn value_multiplier(score: f64) -> f64 {
    if score >= 8.0 {
        3.0
    } else if score >= 7.0 {
        2.0
    } else if score >= 5.5 {
        1.5
    } else {
        1.0
    }
}

/// Total dollar value of `leads`, rounded.
pub fn estimate_value(leads: &[Lead]) -> u64 {
    leads
        .iter()
        .map(|l| BASE_LEAD_VALUE * value_multiplier(l.cold_email_score))
        .sum::<f64>()
        .round() as u64
}

/// Leads ready for immediate outreach: valid email and score of at least 7,
/// best first, at most `limit`.
pub fn priority_leads(leads: &[Lead], limit: usize) -> Vec<&Lead> {
    let mut picked: Vec<&Lead> = leads
        .iter()
        .filter(|l| l.email_valid.is_valid() && l.cold_email_score >= PRIORITY_MIN_SCORE)
        .collect();
    picked.sort_by(|a, b| b.cold_email_score.total_cmp(&a.cold_email_score));
    picked.truncate(limit);
    picked
}

/// Aggregate figures for one ranked result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadStats {
    pub total: usize,
    pub valid_emails: usize,
    pub valid_phones: usize,
    pub with_profile: usize,
    pub with_company: usize,
    pub with_job_title: usize,
    /// Score ≥ 8.
    pub high_score: usize,
    /// 5.5 ≤ score < 8.
    pub medium_score: usize,
    pub low_score: usize,
    pub average_score: f64,
    /// Mean response likelihood, as a whole percentage.
    pub response_likelihood_pct: u32,
    /// Dollar value of the set: $50 per lead, weighted up by score band.
    pub estimated_value: u64,
    /// Lead count per outreach tier (URGENT / HIGH / MEDIUM / LOW).
    pub by_priority: BTreeMap<String, usize>,
    pub by_industry: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    /// `"<title> (<count>)"`, most frequent first.
    pub top_job_titles: Vec<String>,
}

impl LeadStats {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let total = leads.len();
        let count = |pred: &dyn Fn(&Lead) -> bool| leads.iter().filter(|l| pred(l)).count();

        let (average_score, response_likelihood_pct) = if total == 0 {
            (0.0, 0)
        } else {
            let score_sum: f64 = leads.iter().map(|l| l.cold_email_score).sum();
            let likelihood_sum: f64 = leads.iter().map(|l| l.response_likelihood).sum();
            let average = ((score_sum / total as f64) * 100.0).round() / 100.0;
            (average, (likelihood_sum / total as f64 * 100.0).round() as u32)
        };

        let mut by_priority = BTreeMap::new();
        let mut by_industry = BTreeMap::new();
        let mut by_source = BTreeMap::new();
        let mut titles: HashMap<&str, usize> = HashMap::new();
        for lead in leads {
            *by_priority
                .entry(priority_for(lead.cold_email_score).to_string())
                .or_insert(0) += 1;
            *by_industry
                .entry(lead.industry.clone().unwrap_or_else(|| "Unknown".to_string()))
                .or_insert(0) += 1;
            *by_source.entry(lead.source.to_string()).or_insert(0) += 1;
            *titles.entry(lead.job_title.as_deref().unwrap_or("N/A")).or_insert(0) += 1;
        }

        let mut titles: Vec<(&str, usize)> = titles.into_iter().collect();
        titles.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Self {
            total,
            valid_emails: count(&|l| l.email_valid.is_valid()),
            valid_phones: count(&|l| l.phone_valid.is_valid()),
            with_profile: count(&|l| l.linkedin.is_some()),
            with_company: count(&|l| l.company.is_some()),
            with_job_title: count(&|l| l.job_title.is_some()),
            high_score: count(&|l| l.cold_email_score >= 8.0),
            medium_score: count(&|l| l.cold_email_score >= 5.5 && l.cold_email_score < 8.0),
            low_score: count(&|l| l.cold_email_score < 5.5),
            average_score,
            response_likelihood_pct,
            estimated_value: estimate_value(leads),
            by_priority,
            by_industry,
            by_source,
            top_job_titles: titles
                .into_iter()
                .map(|(title, n)| format!("{} ({})", title, n))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadSource, Validity};

    #[test]
    fn test_empty_set() {
        let stats = LeadStats::from_leads(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.response_likelihood_pct, 0);
        assert_eq!(stats.estimated_value, 0);
        assert!(stats.by_priority.is_empty());
        assert!(stats.top_job_titles.is_empty());
    }

    #[test]
    fn test_bands_and_groups() {
        let mut a = Lead::new("Alpha", LeadSource::OpenStreetMap);
        a.cold_email_score = 9.0;
        a.response_likelihood = 0.25;
        a.email_valid = Validity::Valid;
        a.industry = Some("saas".to_string());
        a.job_title = Some("CEO".to_string());

        let mut b = Lead::new("Bravo", LeadSource::Nominatim);
        b.cold_email_score = 6.0;
        b.response_likelihood = 0.08;
        b.job_title = Some("CEO".to_string());

        let mut c = Lead::new("Charlie", LeadSource::OpenStreetMap);
        c.cold_email_score = 3.0;
        c.response_likelihood = 0.03;

        let stats = LeadStats::from_leads(&[a, b, c]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid_emails, 1);
        assert_eq!((stats.high_score, stats.medium_score, stats.low_score), (1, 1, 1));
        assert_eq!(stats.average_score, 6.0);
        assert_eq!(stats.response_likelihood_pct, 12);
        // 150 + 75 + 50
        assert_eq!(stats.estimated_value, 275);
        assert_eq!(stats.by_priority.get("URGENT"), Some(&1));
        assert_eq!(stats.by_priority.get("MEDIUM"), Some(&1));
        assert_eq!(stats.by_priority.get("LOW"), Some(&1));
        assert_eq!(stats.by_priority.get("HIGH"), None);
        assert_eq!(stats.by_industry.get("Unknown"), Some(&2));
        assert_eq!(stats.by_source.get("openstreetmap"), Some(&2));
        assert_eq!(stats.top_job_titles, vec!["CEO (2)", "N/A (1)"]);
    }

    #[test]
    fn test_value_multiplier_steps() {
        let at = |score: f64| {
            let mut lead = Lead::new("Step", LeadSource::OpenStreetMap);
            lead.cold_email_score = score;
            lead
        };
        assert_eq!(estimate_value(&[at(8.0)]), 150);
        assert_eq!(estimate_value(&[at(7.0)]), 100);
        assert_eq!(estimate_value(&[at(5.5)]), 75);
        assert_eq!(estimate_value(&[at(5.49)]), 50);
        assert_eq!(estimate_value(&[at(5.5), at(5.5), at(5.5)]), 225);
    }

    #[test]
    fn test_priority_leads_need_valid_email_and_score() {
        let lead = |name: &str, score: f64, valid: Validity| {
            let mut lead = Lead::new(name, LeadSource::OpenStreetMap);
            lead.cold_email_score = score;
            lead.email_valid = valid;
            lead
        };
        let leads = vec![
            lead("warm", 7.2, Validity::Valid),
            lead("unchecked", 9.5, Validity::Unknown),
            lead("hot", 9.1, Validity::Valid),
            lead("cold", 6.9, Validity::Valid),
            lead("steady", 7.0, Validity::Valid),
        ];

        let names: Vec<_> = priority_leads(&leads, 10).iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["hot", "warm", "steady"]);
        assert_eq!(priority_leads(&leads, 1).len(), 1);
    }
}
