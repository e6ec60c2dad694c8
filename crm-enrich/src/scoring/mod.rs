//! Lead scoring
//!
//! Additive point rules over the fused profile. Every rule that fires emits a
//! [`Signal`]; the score is the plain sum clamped to 100 and the grade is a
//! step function of the score.

pub mod summary;

pub use summary::{build_summary, LIMITED_DATA_SUMMARY};

use crate::fusion::{MergedProfile, ProfileField};
use crate::types::{non_empty, ApolloPerson, PropertyRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum score
pub const MAX_SCORE: u32 = 100;

/// Signals kept on the persisted profile
pub const TOP_SIGNAL_COUNT: usize = 5;

/// Residential units above which an owner counts as a major portfolio
pub const MAJOR_PORTFOLIO_UNITS: u32 = 50;

const DECISION_MAKER_PATTERNS: &[&str] = &[
    "owner", "president", "ceo", "director", "vp", "partner", "principal", "founder",
];

const SENIOR_ROLE_PATTERNS: &[&str] = &["manager", "head", "lead", "senior", "executive"];

/// One fired scoring rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub label: String,
    pub points: u32,
    pub detail: String,
}

impl Signal {
    fn new(label: &str, points: u32, detail: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            points,
            detail: detail.into(),
        }
    }
}

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => Grade::A,
            s if s >= 60 => Grade::B,
            s if s >= 40 => Grade::C,
            s if s >= 20 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the scorer looks at
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub identity_likelihood: Option<i32>,
    pub deep_search_match: bool,
    pub apollo_person: Option<&'a ApolloPerson>,
    pub organization_name: Option<&'a str>,
    pub profile: &'a MergedProfile,
    pub properties: &'a [PropertyRecord],
    pub activity_count: i64,
}

/// Score, grade and every fired signal (sorted by points, descending)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScore {
    pub score: u32,
    pub grade: Grade,
    pub signals: Vec<Signal>,
}

impl LeadScore {
    pub fn top_signals(&self) -> &[Signal] {
        &self.signals[..self.signals.len().min(TOP_SIGNAL_COUNT)]
    }
}

fn matches_any(text: &str, patterns: &[&str]) -> bool {
    let lower = text.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

/// Total residential units across `properties`
pub fn total_units(properties: &[PropertyRecord]) -> u32 {
    properties.iter().map(|p| p.units).fold(0u32, u32::saturating_add)
}

/// Apply every rule to `input`
pub fn score_lead(input: &ScoringInput<'_>) -> LeadScore {
    let mut signals = Vec::new();
    let profile = input.profile;
    let channels = &profile.channels;

    if let Some(likelihood) = input.identity_likelihood {
        signals.push(Signal::new(
            "Identity match",
            15,
            format!("People Data Labs match (likelihood {likelihood})"),
        ));
        if input.deep_search_match {
            signals.push(Signal::new(
                "Deep search match",
                5,
                "Matched by name and location search",
            ));
        }
    }

    if let Some(person) = input.apollo_person {
        signals.push(Signal::new("Apollo person match", 10, "Apollo returned a person record"));
        if let Some(email) = non_empty(person.email.as_deref()) {
            signals.push(Signal::new(
                "Provider-confirmed email",
                5,
                format!("Apollo email {email}"),
            ));
        }
    }

    if let Some(name) = input.organization_name {
        signals.push(Signal::new("Organization match", 5, format!("Apollo organization {name}")));
    }

    if channels.phone_confirmed() {
        signals.push(Signal::new(
            "Phone confirmed",
            8,
            "Same phone reported by multiple providers",
        ));
    } else if let Some(phone) = channels.phones.first() {
        signals.push(Signal::new("Phone available", 8, format!("Phone {phone}")));
    }

    if channels.email_confirmed() {
        signals.push(Signal::new(
            "Email confirmed",
            5,
            "Same email reported by multiple providers",
        ));
    } else if let Some(email) = channels.emails.first() {
        signals.push(Signal::new("Email available", 7, format!("Email {email}")));
    }

    if let Some(url) = profile.get(ProfileField::LinkedinUrl) {
        signals.push(Signal::new("LinkedIn profile", 5, url));
    }

    if let Some(title) = profile.get(ProfileField::JobTitle) {
        if matches_any(title, DECISION_MAKER_PATTERNS) {
            signals.push(Signal::new("Decision maker", 10, title));
        } else if matches_any(title, SENIOR_ROLE_PATTERNS) {
            signals.push(Signal::new("Senior role", 7, title));
        }
    }

    if let Some(industry) = profile.get(ProfileField::Industry) {
        if industry.to_lowercase().contains("real estate") {
            signals.push(Signal::new("Real estate industry", 5, industry));
        }
    }

    if !input.properties.is_empty() {
        let units = total_units(input.properties);
        signals.push(Signal::new(
            "Property owner",
            15,
            format!("{} NYC properties on record", input.properties.len()),
        ));
        if units > MAJOR_PORTFOLIO_UNITS {
            signals.push(Signal::new("Major portfolio", 10, format!("{units} residential units")));
        }
    }

    match input.activity_count {
        n if n > 5 => signals.push(Signal::new(
            "Highly engaged",
            8,
            format!("{n} prior activities"),
        )),
        n if n >= 1 => signals.push(Signal::new("Engaged", 3, format!("{n} prior activities"))),
        _ => {}
    }

    // Stable sort keeps rule order among equal point values
    signals.sort_by(|a, b| b.points.cmp(&a.points));

    let sum: u32 = signals.iter().map(|s| s.points).sum();
    let score = sum.min(MAX_SCORE);

    LeadScore {
        score,
        grade: Grade::from_score(score),
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{ContactChannels, FieldValue};
    use crate::types::ProviderSource;

    fn input<'a>(profile: &'a MergedProfile, properties: &'a [PropertyRecord]) -> ScoringInput<'a> {
        ScoringInput {
            identity_likelihood: None,
            deep_search_match: false,
            apollo_person: None,
            organization_name: None,
            profile,
            properties,
            activity_count: 0,
        }
    }

    fn property(units: u32) -> PropertyRecord {
        PropertyRecord {
            address: "1 MAIN ST".to_string(),
            borough: "BK".to_string(),
            units,
            assessed_value: 0.0,
            owner_name: "LOVELACE ADA".to_string(),
            parcel_id: "3000010001".to_string(),
        }
    }

    fn with_field(field: ProfileField, value: &str) -> MergedProfile {
        let mut profile = MergedProfile::default();
        profile.fields.insert(
            field,
            FieldValue {
                value: value.to_string(),
                source: ProviderSource::Pdl,
            },
        );
        profile
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(80), Grade::A);
        assert_eq!(Grade::from_score(79), Grade::B);
        assert_eq!(Grade::from_score(60), Grade::B);
        assert_eq!(Grade::from_score(40), Grade::C);
        assert_eq!(Grade::from_score(20), Grade::D);
        assert_eq!(Grade::from_score(19), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn test_no_signals_is_zero_f() {
        let profile = MergedProfile::default();
        let result = score_lead(&input(&profile, &[]));
        assert_eq!(result.score, 0);
        assert_eq!(result.grade, Grade::F);
        assert!(result.signals.is_empty());
    }

    #[test]
    fn test_property_portfolio_bonus() {
        let profile = MergedProfile::default();
        let properties = vec![property(20), property(20), property(20)];
        let result = score_lead(&input(&profile, &properties));

        assert_eq!(result.score, 25);
        assert_eq!(result.grade, Grade::D);
        assert_eq!(result.signals[0].label, "Property owner");
        assert_eq!(result.signals[1].label, "Major portfolio");
    }

    #[test]
    fn test_exactly_fifty_units_is_not_major() {
        let profile = MergedProfile::default();
        let properties = vec![property(50)];
        assert_eq!(score_lead(&input(&profile, &properties)).score, 15);
    }

    #[test]
    fn test_decision_maker_beats_senior() {
        let profile = with_field(ProfileField::JobTitle, "Senior Managing Director");
        let result = score_lead(&input(&profile, &[]));
        assert_eq!(result.score, 10);
        assert_eq!(result.signals[0].label, "Decision maker");

        let profile = with_field(ProfileField::JobTitle, "Leasing Manager");
        assert_eq!(score_lead(&input(&profile, &[])).score, 7);

        let profile = with_field(ProfileField::JobTitle, "Agent");
        assert_eq!(score_lead(&input(&profile, &[])).score, 0);
    }

    #[test]
    fn test_industry_match_is_case_insensitive() {
        let profile = with_field(ProfileField::Industry, "Commercial Real Estate");
        assert_eq!(score_lead(&input(&profile, &[])).score, 5);
    }

    #[test]
    fn test_confirmed_and_available_are_exclusive() {
        let mut profile = MergedProfile::default();
        profile.channels = ContactChannels {
            emails: vec!["ada@engines.com".to_string()],
            phones: vec!["2125550100".to_string()],
            ..Default::default()
        };
        profile
            .channels
            .email_sources
            .insert(
                "ada@engines.com".to_string(),
                vec![ProviderSource::ApolloPerson, ProviderSource::Pdl],
            );

        let result = score_lead(&input(&profile, &[]));
        let labels: Vec<&str> = result.signals.iter().map(|s| s.label.as_str()).collect();

        assert!(labels.contains(&"Email confirmed"));
        assert!(!labels.contains(&"Email available"));
        assert!(labels.contains(&"Phone available"));
        assert!(!labels.contains(&"Phone confirmed"));
        assert_eq!(result.score, 5 + 8);
    }

    #[test]
    fn test_activity_tiers() {
        let profile = MergedProfile::default();
        let mut scoring = input(&profile, &[]);

        scoring.activity_count = 1;
        assert_eq!(score_lead(&scoring).score, 3);
        scoring.activity_count = 5;
        assert_eq!(score_lead(&scoring).score, 3);
        scoring.activity_count = 6;
        assert_eq!(score_lead(&scoring).score, 8);
    }

    #[test]
    fn test_score_clamped_and_top_five() {
        let mut profile = with_field(ProfileField::JobTitle, "Founder");
        profile.fields.insert(
            ProfileField::Industry,
            FieldValue { value: "real estate".to_string(), source: ProviderSource::Pdl },
        );
        profile.fields.insert(
            ProfileField::LinkedinUrl,
            FieldValue { value: "linkedin.com/in/ada".to_string(), source: ProviderSource::Pdl },
        );
        profile.channels.emails = vec!["ada@engines.com".to_string()];
        profile.channels.phones = vec!["2125550100".to_string()];
        let person = ApolloPerson {
            email: Some("ada@engines.com".to_string()),
            ..Default::default()
        };
        let properties = vec![property(40), property(30)];

        let result = score_lead(&ScoringInput {
            identity_likelihood: Some(8),
            deep_search_match: true,
            apollo_person: Some(&person),
            organization_name: Some("Analytical Engines"),
            profile: &profile,
            properties: &properties,
            activity_count: 12,
        });

        let sum: u32 = result.signals.iter().map(|s| s.points).sum();
        assert!(sum > 100);
        assert_eq!(result.score, 100);
        assert_eq!(result.grade, Grade::A);
        assert_eq!(result.top_signals().len(), 5);
        assert!(result
            .signals
            .windows(2)
            .all(|pair| pair[0].points >= pair[1].points));
    }
}
