/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use rust_lead_pipeline::config::{RunConfig, RunConfigRequest};
use rust_lead_pipeline::dedup::dedupe;
use rust_lead_pipeline::enrichment::classify_industry;
use rust_lead_pipeline::filter::filter;
use rust_lead_pipeline::geo::distance_km;
use rust_lead_pipeline::models::{Lead, LeadSource, QualityTier, Validity};
use rust_lead_pipeline::pipeline::rank;
use rust_lead_pipeline::scoring::{score_lead, MAX_SCORE};
use rust_lead_pipeline::sources::{quality_score, QualitySignals};
use rust_lead_pipeline::validator::{is_valid_email_format, validate_phone};

fn validity() -> impl Strategy<Value = Validity> {
    prop_oneof![
        Just(Validity::Valid),
        Just(Validity::Invalid),
        Just(Validity::Unknown)
    ]
}

prop_compose! {
    fn arb_lead()(
        name in prop_oneof![Just("Cafe Uno"), Just("cafe uno "), Just("Bistro"), Just("Glow Salon")],
        email in proptest::option::of(prop_oneof![Just("a@x.com"), Just("A@X.com"), Just("b@y.org")]),
        phone in proptest::option::of(prop_oneof![Just("022 2345 6789"), Just("12345")]),
        website in proptest::option::of(Just("https://example.com")),
        quality in 0.0f64..=1.0,
        distance in 0.0f64..40.0,
        (verified, rating) in (any::<bool>(), proptest::option::of(0.0f64..=5.0)),
        (email_valid, phone_valid) in (validity(), validity()),
        job_title in proptest::option::of(prop_oneof![Just("CEO"), Just("Engineer"), Just("Professional")]),
        industry in proptest::option::of(prop_oneof![Just("saas"), Just("agency")]),
        source in prop_oneof![Just(LeadSource::OpenStreetMap), Just(LeadSource::Nominatim)],
    ) -> Lead {
        let mut lead = Lead::new(name, source).with_quality(quality).with_distance(distance);
        lead.email = email.map(String::from);
        lead.phone = phone.map(String::from);
        lead.website = website.map(String::from);
        lead.verified = verified;
        lead.rating = rating;
        lead.email_valid = email_valid;
        lead.phone_valid = phone_valid;
        lead.job_title = job_title.map(String::from);
        lead.industry = industry.map(String::from);
        lead
    }
}

fn run(quality: QualityTier, radius_km: f64, contactable_only: bool) -> RunConfig {
    RunConfig::resolve(RunConfigRequest {
        category: "restaurants".to_string(),
        city: "Mumbai".to_string(),
        quality,
        radius_km,
        contactable_only,
        ..Default::default()
    })
    .unwrap()
}

// Property: geo math
proptest! {
    #[test]
    fn distance_to_self_is_zero(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
        prop_assert_eq!(distance_km(lat, lon, lat, lon), 0.0);
    }

    #[test]
    fn distance_is_symmetric_and_non_negative(
        lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
        lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0
    ) {
        let d = distance_km(lat1, lon1, lat2, lon2);
        prop_assert!(d >= 0.0);
        prop_assert_eq!(d, distance_km(lat2, lon2, lat1, lon1));
    }
}

// Property: scores stay in range
proptest! {
    #[test]
    fn quality_score_in_unit_range(
        has_email in any::<bool>(), has_phone in any::<bool>(), has_website in any::<bool>(),
        has_address in any::<bool>(), has_hours in any::<bool>()
    ) {
        let q = quality_score(QualitySignals { has_email, has_phone, has_website, has_address, has_hours });
        prop_assert!((0.0..=1.0).contains(&q));
    }

    #[test]
    fn cold_email_score_in_range(lead in arb_lead()) {
        let breakdown = score_lead(&lead);
        prop_assert!(breakdown.score >= 0.0 && breakdown.score <= MAX_SCORE);
        prop_assert_eq!(breakdown.factors.is_empty(), breakdown.raw_points == 0);
    }
}

// Property: dedupe, filter and rank
proptest! {
    #[test]
    fn dedupe_is_idempotent_and_never_grows(leads in proptest::collection::vec(arb_lead(), 0..20)) {
        let once = dedupe(leads.clone());
        prop_assert!(once.len() <= leads.len());
        prop_assert_eq!(dedupe(once.clone()), once);
    }

    #[test]
    fn filter_is_a_pure_predicate(
        leads in proptest::collection::vec(arb_lead(), 0..20),
        radius in 1.0f64..30.0,
        contactable_only in any::<bool>()
    ) {
        let config = run(QualityTier::Medium, radius, contactable_only);
        let once = filter(leads.clone(), &config);
        prop_assert_eq!(filter(leads, &config), once.clone());
        prop_assert_eq!(filter(once.clone(), &config), once);
    }

    #[test]
    fn rank_is_sorted_and_stable(
        scores in proptest::collection::vec(prop_oneof![Just(2.0f64), Just(5.5), Just(8.0)], 0..30),
        count in 1usize..40
    ) {
        let leads: Vec<Lead> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut lead = Lead::new(format!("lead-{:03}", i), LeadSource::OpenStreetMap);
                lead.cold_email_score = *s;
                lead
            })
            .collect();

        let ranked = rank(leads, count);
        prop_assert!(ranked.len() <= count);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].cold_email_score >= pair[1].cold_email_score);
            if pair[0].cold_email_score == pair[1].cold_email_score {
                // zero-padded index keeps lexical order equal to input order
                prop_assert!(pair[0].name < pair[1].name);
            }
        }
    }
}

// Property: validators never panic
proptest! {
    #[test]
    fn email_format_check_never_panics(email in "\\PC*") {
        let _ = is_valid_email_format(&email);
    }

    #[test]
    fn phone_validation_never_panics(phone in "\\PC*") {
        let _ = validate_phone(&phone);
    }

    #[test]
    fn industry_classification_never_panics(text in "\\PC*") {
        let _ = classify_industry(&text);
    }

    #[test]
    fn formatted_ten_digit_numbers_are_valid(number in 1000000000u64..=9999999999u64) {
        let digits = number.to_string();
        let phone = format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]);
        prop_assert!(validate_phone(&phone).valid);
    }
}
