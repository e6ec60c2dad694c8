//! Email / phone fusion with provenance
//!
//! Values are compared in normalized form (phone: last 10 digits, email:
//! trimmed lowercase). The provenance map records which providers reported
//! each normalized value; a value reported by two or more distinct providers
//! is "confirmed".

use crate::types::{ApolloPerson, PdlPerson, ProviderSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Normalized value → providers that reported it
pub type ProvenanceMap = BTreeMap<String, Vec<ProviderSource>>;

/// Providers needed before a value counts as confirmed
pub const CONFIRMATION_THRESHOLD: usize = 2;

/// Last 10 digits; None when the input has no digits
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let start = digits.len().saturating_sub(10);
    Some(digits[start..].iter().collect())
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        None
    } else {
        Some(email)
    }
}

fn dedupe_by<F>(values: &[String], key: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut seen = HashSet::new();
    values
        .iter()
        .filter_map(|v| key(v).map(|k| (k, v)))
        .filter(|(k, _)| seen.insert(k.clone()))
        .map(|(_, v)| v.trim().to_string())
        .collect()
}

/// First occurrence wins; comparison is case-insensitive
pub fn dedupe_emails(values: &[String]) -> Vec<String> {
    dedupe_by(values, normalize_email)
        .into_iter()
        .filter_map(|e| normalize_email(&e))
        .collect()
}

/// First occurrence wins; comparison uses the last 10 digits
pub fn dedupe_phones(values: &[String]) -> Vec<String> {
    dedupe_by(values, normalize_phone)
}

/// Record `source` against each value, once per provider
pub fn record_provenance<F>(
    map: &mut ProvenanceMap,
    values: &[String],
    source: ProviderSource,
    normalize: F,
) where
    F: Fn(&str) -> Option<String>,
{
    for key in values.iter().filter_map(|v| normalize(v)) {
        let sources = map.entry(key).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
}

/// Deduplicated contact channels with provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactChannels {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub email_sources: ProvenanceMap,
    pub phone_sources: ProvenanceMap,
}

impl ContactChannels {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }

    pub fn email_confirmed(&self) -> bool {
        is_confirmed(&self.email_sources)
    }

    pub fn phone_confirmed(&self) -> bool {
        is_confirmed(&self.phone_sources)
    }

    /// First confirmed email, else the first email
    pub fn best_email(&self) -> Option<&str> {
        best(&self.emails, &self.email_sources, normalize_email)
    }

    /// First confirmed phone, else the first phone
    pub fn best_phone(&self) -> Option<&str> {
        best(&self.phones, &self.phone_sources, normalize_phone)
    }
}

fn is_confirmed(map: &ProvenanceMap) -> bool {
    map.values().any(|sources| sources.len() >= CONFIRMATION_THRESHOLD)
}

fn best<'a, F>(values: &'a [String], map: &ProvenanceMap, normalize: F) -> Option<&'a str>
where
    F: Fn(&str) -> Option<String>,
{
    values
        .iter()
        .find(|v| {
            normalize(v)
                .and_then(|k| map.get(&k))
                .is_some_and(|sources| sources.len() >= CONFIRMATION_THRESHOLD)
        })
        .or_else(|| values.first())
        .map(String::as_str)
}

/// Collect emails and phones from the person-level providers
///
/// Organization phones are switchboard numbers and are not candidates.
pub fn fuse_channels(
    pdl: Option<&PdlPerson>,
    apollo_person: Option<&ApolloPerson>,
) -> ContactChannels {
    let mut channels = ContactChannels::default();
    let mut emails = Vec::new();
    let mut phones = Vec::new();

    if let Some(person) = apollo_person {
        let person_emails: Vec<String> = person.email.iter().cloned().collect();
        record_provenance(
            &mut channels.email_sources,
            &person_emails,
            ProviderSource::ApolloPerson,
            normalize_email,
        );
        record_provenance(
            &mut channels.phone_sources,
            &person.phone_numbers,
            ProviderSource::ApolloPerson,
            normalize_phone,
        );
        emails.extend(person_emails);
        phones.extend(person.phone_numbers.iter().cloned());
    }

    if let Some(person) = pdl {
        let pdl_emails = person.all_emails();
        let pdl_phones = person.all_phones();
        record_provenance(
            &mut channels.email_sources,
            &pdl_emails,
            ProviderSource::Pdl,
            normalize_email,
        );
        record_provenance(
            &mut channels.phone_sources,
            &pdl_phones,
            ProviderSource::Pdl,
            normalize_phone,
        );
        emails.extend(pdl_emails);
        phones.extend(pdl_phones);
    }

    channels.emails = dedupe_emails(&emails);
    channels.phones = dedupe_phones(&phones);
    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_phone_keeps_last_ten_digits() {
        assert_eq!(normalize_phone("+1 (212) 555-0100").as_deref(), Some("2125550100"));
        assert_eq!(normalize_phone("555-0100").as_deref(), Some("5550100"));
        assert_eq!(normalize_phone("n/a"), None);
    }

    #[test]
    fn test_email_dedupe_is_case_insensitive() {
        let deduped = dedupe_emails(&strings(&["A@x.com", "a@x.com ", "", "b@x.com"]));
        assert_eq!(deduped, strings(&["a@x.com", "b@x.com"]));
    }

    #[test]
    fn test_phone_dedupe_keeps_first_occurrence() {
        let deduped = dedupe_phones(&strings(&["+1 212 555 0100", "2125550100", "718-555-0199"]));
        assert_eq!(deduped, strings(&["+1 212 555 0100", "718-555-0199"]));
    }

    #[test]
    fn test_cross_provider_confirmation() {
        let pdl = PdlPerson {
            mobile_phone: Some("+12125550100".to_string()),
            work_email: Some("ada@engines.com".to_string()),
            ..Default::default()
        };
        let apollo = ApolloPerson {
            email: Some("ADA@engines.com".to_string()),
            phone_numbers: strings(&["(212) 555-0100"]),
            ..Default::default()
        };

        let channels = fuse_channels(Some(&pdl), Some(&apollo));

        assert_eq!(channels.emails, strings(&["ada@engines.com"]));
        assert_eq!(channels.phones.len(), 1);
        assert!(channels.email_confirmed());
        assert!(channels.phone_confirmed());
        assert_eq!(
            channels.phone_sources["2125550100"],
            vec![ProviderSource::ApolloPerson, ProviderSource::Pdl]
        );
    }

    #[test]
    fn test_single_source_is_not_confirmed() {
        let pdl = PdlPerson {
            mobile_phone: Some("2125550100".to_string()),
            phone_numbers: strings(&["212.555.0100"]),
            ..Default::default()
        };

        let channels = fuse_channels(Some(&pdl), None);
        assert_eq!(channels.phones.len(), 1);
        assert!(!channels.phone_confirmed());
        assert_eq!(channels.best_phone(), Some("2125550100"));
    }

    #[test]
    fn test_best_prefers_confirmed_value() {
        let pdl = PdlPerson {
            phone_numbers: strings(&["7185550199", "2125550100"]),
            ..Default::default()
        };
        let apollo = ApolloPerson {
            phone_numbers: strings(&["2125550100"]),
            ..Default::default()
        };

        let channels = fuse_channels(Some(&pdl), Some(&apollo));
        assert_eq!(channels.best_phone(), Some("2125550100"));
    }
}
