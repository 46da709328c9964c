//! Contactability checks for email addresses and phone numbers.
//!
//! Email validation runs format → disposable-domain → MX lookup. A failed
//! lookup is `Validity::Unknown`; only a definitive "no records" answer marks
//! the address invalid.

use crate::config::{Config, RunConfig};
use crate::errors::AppError;
use crate::models::{
    EmailReason, EmailValidation, Lead, PhoneReason, PhoneValidation, Validity,
};
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use moka::future::Cache;
use once_cell::sync::Lazy;
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Confidence attached to an address that passed every check.
/// MX presence alone does not prove deliverability.
pub const VALID_EMAIL_CONFIDENCE: f64 = 0.8;

/// Minimum digits in a usable phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Single `@`, at least one dot in the domain, no whitespace.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Digits plus common punctuation, at least ten characters.
static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d+\-\s().]{10,}$").expect("phone regex is valid"));

/// Throwaway mailbox providers.
pub const DISPOSABLE_DOMAINS: &[&str] = &[
    "tempmail.com",
    "guerrillamail.com",
    "10minutemail.com",
    "throwaway.email",
    "mailinator.com",
    "sharklasers.com",
    "yopmail.com",
    "trashmail.com",
];

/// Whether the address's domain (or a parent domain) is on the denylist.
pub fn is_disposable(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    let domain = domain.trim().to_lowercase();
    DISPOSABLE_DOMAINS
        .iter()
        .any(|d| domain == *d || domain.ends_with(&format!(".{}", d)))
}

pub fn is_valid_email_format(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Format-only phone check: permissive pattern, then at least ten digits.
pub fn validate_phone(phone: &str) -> PhoneValidation {
    let trimmed = phone.trim();
    if !PHONE_REGEX.is_match(trimmed) {
        return PhoneValidation {
            valid: false,
            reason: PhoneReason::InvalidFormat,
        };
    }

    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < MIN_PHONE_DIGITS {
        return PhoneValidation {
            valid: false,
            reason: PhoneReason::TooShort,
        };
    }

    PhoneValidation {
        valid: true,
        reason: PhoneReason::ValidFormat,
    }
}

/// E.164 form of `raw` for the given ISO country code, if it parses as a valid number.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let region = country_code.trim().to_uppercase().parse::<CountryId>().ok();
    match phonenumber::parse(region, raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.format().mode(Mode::E164).to_string())
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Could not parse phone '{}': {:?}", raw, e);
            None
        }
    }
}

// ============ MX lookups ============

/// Definitive answer from a mail-exchange lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MxOutcome {
    /// At least one MX record exists.
    Found(usize),
    /// The domain definitively has no MX records.
    NoRecords,
}

/// Mail-exchange record lookup. An `Err` means the lookup itself failed.
#[async_trait]
pub trait MxLookup: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<MxOutcome, AppError>;
}

/// [`MxLookup`] backed by the system resolver.
pub struct DnsMxLookup {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsMxLookup {
    pub fn new(timeout: Duration) -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                tracing::warn!("System DNS config unavailable ({}), using defaults", e);
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self { resolver, timeout }
    }
}

#[async_trait]
impl MxLookup for DnsMxLookup {
    async fn lookup_mx(&self, domain: &str) -> Result<MxOutcome, AppError> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain)).await;

        match lookup {
            Ok(Ok(records)) => {
                let count = records.iter().count();
                if count == 0 {
                    Ok(MxOutcome::NoRecords)
                } else {
                    Ok(MxOutcome::Found(count))
                }
            }
            Ok(Err(e)) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(MxOutcome::NoRecords),
                _ => Err(AppError::ExternalApiError(format!(
                    "MX lookup failed for {}: {}",
                    domain, e
                ))),
            },
            Err(_) => Err(AppError::ExternalApiError(format!(
                "MX lookup timed out for {}",
                domain
            ))),
        }
    }
}

// ============ Validator stage ============

/// Email/phone validation stage.
pub struct Validator {
    mx: Arc<dyn MxLookup>,
    /// Definitive MX outcomes per domain; lookup failures are never cached.
    mx_cache: Cache<String, MxOutcome>,
}

impl Validator {
    pub fn new(mx: Arc<dyn MxLookup>) -> Self {
        Self {
            mx,
            mx_cache: Cache::builder()
                .time_to_live(Duration::from_secs(3600))
                .max_capacity(10_000)
                .build(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(DnsMxLookup::new(config.dns_timeout)))
    }

    pub async fn validate_email(&self, email: &str) -> EmailValidation {
        let email = email.trim();
        if !is_valid_email_format(email) {
            return EmailValidation {
                valid: Validity::Invalid,
                reason: EmailReason::InvalidFormat,
                confidence: None,
            };
        }

        if is_disposable(email) {
            return EmailValidation {
                valid: Validity::Invalid,
                reason: EmailReason::Disposable,
                confidence: None,
            };
        }

        // Format check guarantees exactly one '@'.
        let domain = email
            .rsplit_once('@')
            .map(|(_, d)| d.to_lowercase())
            .unwrap_or_default();

        match self.mx_outcome(&domain).await {
            Ok(MxOutcome::Found(_)) => EmailValidation {
                valid: Validity::Valid,
                reason: EmailReason::Valid,
                confidence: Some(VALID_EMAIL_CONFIDENCE),
            },
            Ok(MxOutcome::NoRecords) => EmailValidation {
                valid: Validity::Invalid,
                reason: EmailReason::DomainNotFound,
                confidence: None,
            },
            Err(e) => {
                tracing::warn!("Email domain check indeterminate: {}", e);
                EmailValidation {
                    valid: Validity::Unknown,
                    reason: EmailReason::LookupFailed,
                    confidence: None,
                }
            }
        }
    }

    async fn mx_outcome(&self, domain: &str) -> Result<MxOutcome, AppError> {
        if let Some(cached) = self.mx_cache.get(domain).await {
            return Ok(cached);
        }
        let outcome = self.mx.lookup_mx(domain).await?;
        self.mx_cache.insert(domain.to_string(), outcome).await;
        Ok(outcome)
    }

    /// Attaches email/phone validity to each lead. One lead's lookup failure
    /// only degrades that lead to `Unknown`.
    pub async fn validate_leads(&self, leads: Vec<Lead>, run: &RunConfig) -> Vec<Lead> {
        let total = leads.len();
        let mut validated = Vec::with_capacity(total);

        for mut lead in leads {
            let email = match lead.email.as_deref().filter(|e| !e.trim().is_empty()) {
                Some(email) => self.validate_email(email).await,
                None => EmailValidation {
                    valid: Validity::Invalid,
                    reason: EmailReason::Missing,
                    confidence: None,
                },
            };

            let phone = match lead.phone.as_deref().filter(|p| !p.trim().is_empty()) {
                Some(phone) => validate_phone(phone),
                None => PhoneValidation {
                    valid: false,
                    reason: PhoneReason::Missing,
                },
            };

            let phone_valid = if phone.valid {
                Validity::Valid
            } else {
                Validity::Invalid
            };

            lead.phone_e164 = if phone.valid {
                lead.phone
                    .as_deref()
                    .and_then(|p| normalize_phone(p, &run.country_code))
            } else {
                None
            };
            lead.email_valid = email.valid;
            lead.email_reason = Some(email.reason);
            lead.email_confidence = email.confidence;
            lead.phone_valid = phone_valid;
            lead.phone_reason = Some(phone.reason);
            lead.contactable = email.valid.or(phone_valid);
            validated.push(lead);
        }

        tracing::info!(
            "Validated {} leads: {} valid emails, {} valid phones, {} indeterminate emails",
            total,
            validated.iter().filter(|l| l.email_valid.is_valid()).count(),
            validated.iter().filter(|l| l.phone_valid.is_valid()).count(),
            validated
                .iter()
                .filter(|l| l.email_valid == Validity::Unknown)
                .count()
        );
        validated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email_format("user@example.com"));
        assert!(is_valid_email_format("test.user+tag@sub.example.co.uk"));
        assert!(!is_valid_email_format("not-an-email"));
        assert!(!is_valid_email_format("missing@domain"));
        assert!(!is_valid_email_format("two@@example.com"));
        assert!(!is_valid_email_format("a@b@example.com"));
        assert!(!is_valid_email_format("user @example.com"));
        assert!(!is_valid_email_format("@example.com"));
    }

    #[test]
    fn test_disposable_domains() {
        assert!(is_disposable("user@guerrillamail.com"));
        assert!(is_disposable("user@MAILINATOR.com"));
        assert!(is_disposable("user@eu.mailinator.com"));
        assert!(!is_disposable("user@notmailinator.com"));
        assert!(!is_disposable("user@example.com"));
    }

    #[test]
    fn test_phone_validation() {
        assert_eq!(validate_phone("+91 22 2345 6789").reason, PhoneReason::ValidFormat);
        assert_eq!(validate_phone("(022) 2345-6789").reason, PhoneReason::ValidFormat);
        assert_eq!(validate_phone("12345").reason, PhoneReason::InvalidFormat);
        assert_eq!(validate_phone("call 022 2345 6789").reason, PhoneReason::InvalidFormat);
        assert_eq!(validate_phone("+1 (555) 12").reason, PhoneReason::TooShort);
        assert!(validate_phone("9876543210").valid);
    }

    #[test]
    fn test_normalize_phone_for_country() {
        assert_eq!(
            normalize_phone("(11) 98765-4321", "br").as_deref(),
            Some("+5511987654321")
        );
        assert_eq!(normalize_phone("123", "br"), None);
    }
}
