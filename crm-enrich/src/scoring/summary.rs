//! Plain-language profile summary
//!
//! One templated sentence per source that produced data.

use super::{total_units, ScoringInput};
use crate::fusion::ProfileField;

/// Summary used when no source produced anything
pub const LIMITED_DATA_SUMMARY: &str = "Limited data available from enrichment sources.";

pub fn build_summary(input: &ScoringInput<'_>) -> String {
    let profile = input.profile;
    let mut sentences = Vec::new();

    let name = profile.get(ProfileField::FullName).unwrap_or("This contact");
    match (profile.get(ProfileField::JobTitle), profile.get(ProfileField::Company)) {
        (Some(title), Some(company)) => sentences.push(format!("{name} is {title} at {company}.")),
        (Some(title), None) => sentences.push(format!("{name} works as {title}.")),
        (None, Some(company)) => sentences.push(format!("{name} is associated with {company}.")),
        (None, None) => {}
    }

    if let Some(likelihood) = input.identity_likelihood {
        let method = if input.deep_search_match {
            "name and location search"
        } else {
            "direct match"
        };
        sentences.push(format!(
            "Identity verified by People Data Labs via {method} (likelihood {likelihood}/10)."
        ));
    }

    if input.apollo_person.is_some() {
        match profile.get(ProfileField::Seniority) {
            Some(seniority) => sentences.push(format!(
                "Apollo lists a {seniority}-level professional profile."
            )),
            None => sentences.push("Apollo returned a matching professional profile.".to_string()),
        }
    }

    if let Some(org) = input.organization_name {
        let mut sentence = format!("Organization: {org}");
        if let Some(industry) = profile.get(ProfileField::Industry) {
            sentence.push_str(&format!(" ({industry})"));
        }
        if let Some(size) = profile.get(ProfileField::CompanySize) {
            sentence.push_str(&format!(", about {size} employees"));
        }
        sentence.push('.');
        sentences.push(sentence);
    }

    if !input.properties.is_empty() {
        sentences.push(format!(
            "Owns {} NYC propert{} with {} residential units in total.",
            input.properties.len(),
            if input.properties.len() == 1 { "y" } else { "ies" },
            total_units(input.properties)
        ));
    }

    if sentences.is_empty() {
        LIMITED_DATA_SUMMARY.to_string()
    } else {
        sentences.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{FieldValue, MergedProfile};
    use crate::types::{PropertyRecord, ProviderSource};

    fn empty_input(profile: &MergedProfile) -> ScoringInput<'_> {
        ScoringInput {
            identity_likelihood: None,
            deep_search_match: false,
            apollo_person: None,
            organization_name: None,
            profile,
            properties: &[],
            activity_count: 0,
        }
    }

    #[test]
    fn test_fallback_when_nothing_resolved() {
        let profile = MergedProfile::default();
        assert_eq!(build_summary(&empty_input(&profile)), LIMITED_DATA_SUMMARY);
    }

    #[test]
    fn test_sentences_from_sources() {
        let mut profile = MergedProfile::default();
        for (field, value) in [
            (ProfileField::FullName, "Ada Lovelace"),
            (ProfileField::JobTitle, "Principal"),
            (ProfileField::Company, "Engines LLC"),
        ] {
            profile.fields.insert(
                field,
                FieldValue { value: value.to_string(), source: ProviderSource::Pdl },
            );
        }
        let properties = vec![PropertyRecord {
            address: "1 MAIN ST".to_string(),
            borough: "MN".to_string(),
            units: 12,
            assessed_value: 0.0,
            owner_name: "LOVELACE ADA".to_string(),
            parcel_id: "1000010001".to_string(),
        }];

        let mut input = empty_input(&profile);
        input.identity_likelihood = Some(7);
        input.properties = &properties;

        let summary = build_summary(&input);
        assert!(summary.starts_with("Ada Lovelace is Principal at Engines LLC."));
        assert!(summary.contains("likelihood 7/10"));
        assert!(summary.ends_with("Owns 1 NYC property with 12 residential units in total."));
    }
}
