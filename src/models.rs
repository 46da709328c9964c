use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Lead ============

/// Upstream provider a lead was first seen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    /// Structured point-of-interest data (Overpass API).
    OpenStreetMap,
    /// Free-text place search (Nominatim).
    Nominatim,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::OpenStreetMap => "openstreetmap",
            LeadSource::Nominatim => "nominatim",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state verification outcome.
///
/// `Unknown` means the check could not be completed (e.g. DNS unreachable)
/// and must never be read as `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
    #[default]
    Unknown,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    /// Three-valued OR: valid wins, two definitive failures are invalid.
    pub fn or(self, other: Validity) -> Validity {
        match (self, other) {
            (Validity::Valid, _) | (_, Validity::Valid) => Validity::Valid,
            (Validity::Invalid, Validity::Invalid) => Validity::Invalid,
            _ => Validity::Unknown,
        }
    }
}

/// Outreach tier derived from the cold-email score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutreachPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl fmt::Display for OutreachPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutreachPriority::Urgent => "URGENT",
            OutreachPriority::High => "HIGH",
            OutreachPriority::Medium => "MEDIUM",
            OutreachPriority::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// A normalized business listing flowing through the pipeline.
///
/// Constructed once by a source adapter via [`Lead::new`]; each later stage
/// returns a new value and only writes the fields it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    // identity
    pub name: String,
    pub address: Option<String>,
    pub source: LeadSource,
    /// SHA-256 hex of the dedup key, stamped by the deduplicator.
    pub fingerprint: Option<String>,

    // contact
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,

    // geo
    /// Great-circle distance to the run's anchor, never negative.
    pub distance_km: f64,

    // quality
    /// Weighted completeness checklist in [0, 1].
    pub quality_score: f64,
    pub verified: bool,
    pub opening_hours: Option<String>,
    /// Provider rating in [0, 5].
    pub rating: Option<f64>,
    /// Free text supplied by the provider.
    pub description: Option<String>,

    // validation (owned by the validator)
    pub email_valid: Validity,
    pub phone_valid: Validity,
    pub contactable: Validity,
    pub email_reason: Option<EmailReason>,
    pub phone_reason: Option<PhoneReason>,
    pub email_confidence: Option<f64>,
    /// E.164 form of `phone` when it parses for the run's country.
    pub phone_e164: Option<String>,

    // enrichment (owned by the enricher)
    pub company: Option<String>,
    pub company_description: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub linkedin: Option<String>,
    pub email_source: Option<String>,

    // scoring (owned by the scorer)
    pub cold_email_score: f64,
    pub score_factors: Vec<String>,
    pub outreach_priority: Option<OutreachPriority>,
    pub response_likelihood: f64,
}

impl Lead {
    /// Creates a lead with only identity fields set.
    pub fn new(name: impl Into<String>, source: LeadSource) -> Self {
        Self {
            name: name.into(),
            address: None,
            source,
            fingerprint: None,
            email: None,
            phone: None,
            website: None,
            distance_km: 0.0,
            quality_score: 0.0,
            verified: false,
            opening_hours: None,
            rating: None,
            description: None,
            email_valid: Validity::Unknown,
            phone_valid: Validity::Unknown,
            contactable: Validity::Unknown,
            email_reason: None,
            phone_reason: None,
            email_confidence: None,
            phone_e164: None,
            company: None,
            company_description: None,
            job_title: None,
            industry: None,
            linkedin: None,
            email_source: None,
            cold_email_score: 0.0,
            score_factors: Vec::new(),
            outreach_priority: None,
            response_likelihood: 0.0,
        }
    }

    /// Sets the distance, clamping negatives (and NaN) to zero.
    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance_km = if distance_km.is_nan() {
            0.0
        } else {
            distance_km.max(0.0)
        };
        self
    }

    /// Sets the quality score, clamped to [0, 1].
    pub fn with_quality(mut self, quality_score: f64) -> Self {
        self.quality_score = clamp_unit(quality_score);
        self
    }

    pub fn has_email(&self) -> bool {
        is_present(&self.email)
    }

    pub fn has_phone(&self) -> bool {
        is_present(&self.phone)
    }

    pub fn has_website(&self) -> bool {
        is_present(&self.website)
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ============ Validation ============

/// Why an email failed (or could not complete) validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailReason {
    Valid,
    Missing,
    InvalidFormat,
    Disposable,
    DomainNotFound,
    /// The MX lookup itself failed; outcome is unknown.
    LookupFailed,
}

/// Result of [`crate::validator::Validator::validate_email`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailValidation {
    pub valid: Validity,
    pub reason: EmailReason,
    /// Confidence attached to a passing address.
    pub confidence: Option<f64>,
}

/// Why a phone number failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhoneReason {
    ValidFormat,
    Missing,
    InvalidFormat,
    TooShort,
}

/// Result of [`crate::validator::validate_phone`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneValidation {
    pub valid: bool,
    pub reason: PhoneReason,
}

// ============ Run configuration ============

/// Named minimum quality threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
    Premium,
    /// Any other tier name; uses the default threshold.
    #[serde(other)]
    Unrecognized,
}

impl QualityTier {
    /// Minimum `quality_score` a lead needs to pass this tier.
    pub fn threshold(&self) -> f64 {
        match self {
            QualityTier::Low => 0.0,
            QualityTier::Medium => 0.4,
            QualityTier::High => 0.6,
            QualityTier::Premium => 0.75,
            QualityTier::Unrecognized => 0.5,
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}
