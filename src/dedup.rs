use crate::models::Lead;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Canonical identity key: lowercased, trimmed `email + phone + name`.
pub fn dedup_key(lead: &Lead) -> String {
    format!(
        "{}{}{}",
        lead.email.as_deref().unwrap_or("").trim(),
        lead.phone.as_deref().unwrap_or("").trim(),
        lead.name.trim()
    )
    .to_lowercase()
}

/// Stable SHA-256 identifier (hex) derived from [`dedup_key`].
pub fn fingerprint(lead: &Lead) -> String {
    let mut hasher = Sha256::new();
    hasher.update(dedup_key(lead).as_bytes());
    hex::encode(hasher.finalize())
}

/// Keeps the first lead for each identity key, preserving input order.
/// Survivors carry their [`fingerprint`].
pub fn dedupe(leads: Vec<Lead>) -> Vec<Lead> {
    let before = leads.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<Lead> = leads
        .into_iter()
        .filter(|lead| seen.insert(dedup_key(lead)))
        .map(|mut lead| {
            lead.fingerprint = Some(fingerprint(&lead));
            lead
        })
        .collect();
    tracing::info!(
        "Deduplicated {} candidates into {} unique leads",
        before,
        unique.len()
    );
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadSource;

    fn lead(name: &str, email: Option<&str>, source: LeadSource) -> Lead {
        let mut lead = Lead::new(name, source);
        lead.email = email.map(String::from);
        lead
    }

    #[test]
    fn test_key_is_case_and_whitespace_insensitive() {
        let a = lead(" Cafe Mondegar ", Some("Hi@Cafe.com "), LeadSource::OpenStreetMap);
        let b = lead("cafe mondegar", Some("hi@cafe.com"), LeadSource::Nominatim);
        assert_eq!(dedup_key(&a), dedup_key(&b));
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let leads = vec![
            lead("Cafe", Some("a@x.com"), LeadSource::OpenStreetMap),
            lead("Other", None, LeadSource::OpenStreetMap),
            lead("cafe", Some("A@X.com"), LeadSource::Nominatim),
        ];
        let unique = dedupe(leads);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].source, LeadSource::OpenStreetMap);
        assert_eq!(unique[1].name, "Other");
        assert_eq!(unique[0].fingerprint.as_deref(), Some(fingerprint(&unique[0]).as_str()));
    }
}
