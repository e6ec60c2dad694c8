//! Single-valued profile fields resolved in provider precedence order

use crate::types::{non_empty, ApolloOrg, ApolloPerson, PdlPerson, ProviderSource};
use serde::{Deserialize, Serialize};

/// Single-valued fields of a merged profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    JobTitle,
    Company,
    Industry,
    LinkedinUrl,
    Location,
    CompanyWebsite,
    CompanySize,
    Seniority,
}

impl ProfileField {
    pub const ALL: [ProfileField; 9] = [
        ProfileField::FullName,
        ProfileField::JobTitle,
        ProfileField::Company,
        ProfileField::Industry,
        ProfileField::LinkedinUrl,
        ProfileField::Location,
        ProfileField::CompanyWebsite,
        ProfileField::CompanySize,
        ProfileField::Seniority,
    ];
}

/// A resolved value and the provider that supplied it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
    pub source: ProviderSource,
}

/// A provider response that can answer profile-field lookups
pub trait FieldSource {
    fn source(&self) -> ProviderSource;

    /// Raw value for `field`, or None when this provider has none
    fn field(&self, field: ProfileField) -> Option<String>;
}

fn text(value: &Option<String>) -> Option<String> {
    non_empty(value.as_deref()).map(str::to_string)
}

impl FieldSource for ApolloPerson {
    fn source(&self) -> ProviderSource {
        ProviderSource::ApolloPerson
    }

    fn field(&self, field: ProfileField) -> Option<String> {
        match field {
            ProfileField::FullName => text(&self.name),
            ProfileField::JobTitle => text(&self.title),
            ProfileField::Company => text(&self.organization_name),
            ProfileField::Industry => text(&self.organization_industry),
            ProfileField::LinkedinUrl => text(&self.linkedin_url),
            ProfileField::Location => {
                let parts: Vec<&str> = [self.city.as_deref(), self.state.as_deref()]
                    .into_iter()
                    .filter_map(non_empty)
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
            ProfileField::CompanyWebsite => text(&self.organization_website),
            ProfileField::Seniority => text(&self.seniority),
            ProfileField::CompanySize => None,
        }
    }
}

impl FieldSource for ApolloOrg {
    fn source(&self) -> ProviderSource {
        ProviderSource::ApolloOrg
    }

    // Organization location and LinkedIn describe the company, not the person
    fn field(&self, field: ProfileField) -> Option<String> {
        match field {
            ProfileField::Company => text(&self.name),
            ProfileField::Industry => text(&self.industry),
            ProfileField::CompanyWebsite => text(&self.website_url),
            ProfileField::CompanySize => self
                .estimated_num_employees
                .filter(|n| *n > 0)
                .map(|n| n.to_string()),
            _ => None,
        }
    }
}

impl FieldSource for PdlPerson {
    fn source(&self) -> ProviderSource {
        ProviderSource::Pdl
    }

    fn field(&self, field: ProfileField) -> Option<String> {
        match field {
            ProfileField::FullName => text(&self.full_name),
            ProfileField::JobTitle => text(&self.job_title),
            ProfileField::Company => text(&self.job_company_name),
            ProfileField::Industry => text(&self.industry),
            ProfileField::LinkedinUrl => text(&self.linkedin_url),
            ProfileField::Location => {
                text(&self.location_name).or_else(|| text(&self.location_locality))
            }
            ProfileField::CompanyWebsite => text(&self.job_company_website),
            ProfileField::CompanySize => text(&self.job_company_size),
            ProfileField::Seniority => None,
        }
    }
}

/// Sources in precedence order: Apollo person → Apollo org → PDL
pub fn ordered_sources<'a>(
    apollo_person: Option<&'a ApolloPerson>,
    apollo_org: Option<&'a ApolloOrg>,
    pdl: Option<&'a PdlPerson>,
) -> Vec<&'a dyn FieldSource> {
    let mut sources: Vec<&'a dyn FieldSource> = Vec::with_capacity(3);
    if let Some(person) = apollo_person {
        sources.push(person);
    }
    if let Some(org) = apollo_org {
        sources.push(org);
    }
    if let Some(person) = pdl {
        sources.push(person);
    }
    sources
}

/// First non-empty value wins
pub fn resolve_field(field: ProfileField, sources: &[&dyn FieldSource]) -> Option<FieldValue> {
    sources.iter().find_map(|source| {
        source.field(field).map(|value| FieldValue {
            value,
            source: source.source(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_wins() {
        let person = ApolloPerson {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let pdl = PdlPerson {
            job_title: Some("Principal".to_string()),
            ..Default::default()
        };

        let sources = ordered_sources(Some(&person), None, Some(&pdl));
        let resolved = resolve_field(ProfileField::JobTitle, &sources).unwrap();

        assert_eq!(resolved.value, "Principal");
        assert_eq!(resolved.source, ProviderSource::Pdl);
    }

    #[test]
    fn test_company_size_from_org() {
        let org = ApolloOrg {
            estimated_num_employees: Some(120),
            ..Default::default()
        };
        let pdl = PdlPerson {
            job_company_size: Some("51-200".to_string()),
            ..Default::default()
        };

        let sources = ordered_sources(None, Some(&org), Some(&pdl));
        let resolved = resolve_field(ProfileField::CompanySize, &sources).unwrap();
        assert_eq!(resolved.value, "120");
        assert_eq!(resolved.source, ProviderSource::ApolloOrg);
    }

    #[test]
    fn test_apollo_location_joins_city_state() {
        let person = ApolloPerson {
            city: Some("Brooklyn".to_string()),
            state: Some("New York".to_string()),
            ..Default::default()
        };
        assert_eq!(
            person.field(ProfileField::Location).as_deref(),
            Some("Brooklyn, New York")
        );
    }

    #[test]
    fn test_no_sources_resolves_nothing() {
        assert!(resolve_field(ProfileField::FullName, &[]).is_none());
    }
}
