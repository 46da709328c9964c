use crate::config::RunConfig;
use crate::models::Lead;

/// True iff the lead passes every predicate requested by `run`.
///
/// An absent optional attribute never fails a predicate that was not asked for.
pub fn matches(lead: &Lead, run: &RunConfig) -> bool {
    if lead.quality_score < run.quality.threshold() {
        return false;
    }
    if lead.distance_km > run.radius_km {
        return false;
    }
    if run.contactable_only && !lead.has_phone() && !lead.has_email() {
        return false;
    }
    if run.verified_only && !lead.verified {
        return false;
    }
    if run.require_website && !lead.has_website() {
        return false;
    }
    if let (Some(rating), Some(min)) = (lead.rating, run.min_rating) {
        if rating < min {
            return false;
        }
    }
    true
}

/// Retains the leads matching `run`, in order.
pub fn filter(leads: Vec<Lead>, run: &RunConfig) -> Vec<Lead> {
    let before = leads.len();
    let kept: Vec<Lead> = leads.into_iter().filter(|l| matches(l, run)).collect();
    tracing::info!(
        "Filter kept {} of {} leads (quality {:?}, radius {} km)",
        kept.len(),
        before,
        run.quality,
        run.radius_km
    );
    kept
}
