//! Domain types shared by providers, fusion, scoring and persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Where a piece of enrichment data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSource {
    /// People Data Labs person enrichment
    Pdl,
    /// Apollo person match
    ApolloPerson,
    /// Apollo organization lookup
    ApolloOrg,
    /// NYC PLUTO property ownership records
    PublicRecords,
}

impl ProviderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderSource::Pdl => "pdl",
            ProviderSource::ApolloPerson => "apollo_person",
            ProviderSource::ApolloOrg => "apollo_org",
            ProviderSource::PublicRecords => "nyc_pluto",
        }
    }
}

impl fmt::Display for ProviderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enrichment lifecycle of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    NotEnriched,
    Enriched,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::NotEnriched => "not_enriched",
            EnrichmentStatus::Enriched => "enriched",
        }
    }

    /// Unknown values read as not enriched
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("enriched") => EnrichmentStatus::Enriched,
            _ => EnrichmentStatus::NotEnriched,
        }
    }
}

/// CRM contact as seen by the enrichment pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub organization_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub notes: Option<String>,
    pub qualification_score: Option<i64>,
    pub score_updated_at: Option<DateTime<Utc>>,
    pub enrichment_status: Option<EnrichmentStatus>,
}

impl Contact {
    /// "First Last" with blanks dropped; None when both are blank
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Full name made of at least two whitespace-separated tokens
    pub fn two_token_name(&self) -> Option<String> {
        self.full_name()
            .filter(|name| name.split_whitespace().count() >= 2)
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(self.email.as_deref())
    }

    pub fn phone(&self) -> Option<&str> {
        non_empty(self.phone.as_deref())
    }

    pub fn address(&self) -> Option<&str> {
        non_empty(self.address.as_deref())
    }

    pub fn city(&self) -> Option<&str> {
        non_empty(self.city.as_deref())
    }

    pub fn state(&self) -> Option<&str> {
        non_empty(self.state.as_deref())
    }

    pub fn zip(&self) -> Option<&str> {
        non_empty(self.zip.as_deref())
    }

    /// Company named in free-text notes as a `Company: <name>` line
    pub fn company_from_notes(&self) -> Option<String> {
        let notes = self.notes.as_deref()?;
        notes.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("company") {
                non_empty(Some(value)).map(str::to_string)
            } else {
                None
            }
        })
    }
}

/// Trimmed value, or None when blank
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Providers send `null` for absent lists
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Person record returned by the identity-enrichment provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdlPerson {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_company_name: Option<String>,
    #[serde(default)]
    pub job_company_website: Option<String>,
    #[serde(default)]
    pub job_company_size: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location_locality: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub work_email: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub personal_emails: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub emails: Vec<PdlEmail>,
}

/// Email entry inside a PDL person record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdlEmail {
    pub address: String,
    #[serde(default, rename = "type")]
    pub email_type: Option<String>,
}

impl PdlPerson {
    pub fn has_phone(&self) -> bool {
        non_empty(self.mobile_phone.as_deref()).is_some()
            || self.phone_numbers.iter().any(|p| !p.trim().is_empty())
    }

    /// Every phone in the record, mobile first
    pub fn all_phones(&self) -> Vec<String> {
        self.mobile_phone
            .iter()
            .chain(self.phone_numbers.iter())
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Every email in the record, work email first
    pub fn all_emails(&self) -> Vec<String> {
        self.work_email
            .iter()
            .cloned()
            .chain(self.emails.iter().map(|e| e.address.clone()))
            .chain(self.personal_emails.iter().cloned())
            .filter(|e| !e.trim().is_empty())
            .collect()
    }

    /// Fill every empty field of `self` from `other`; populated fields win
    pub fn backfill_from(&mut self, other: &PdlPerson) {
        fn fill(target: &mut Option<String>, source: &Option<String>) {
            if non_empty(target.as_deref()).is_none() && non_empty(source.as_deref()).is_some() {
                *target = source.clone();
            }
        }
        fn fill_list<T: Clone>(target: &mut Vec<T>, source: &[T]) {
            if target.is_empty() {
                target.extend_from_slice(source);
            }
        }

        fill(&mut self.full_name, &other.full_name);
        fill(&mut self.job_title, &other.job_title);
        fill(&mut self.job_company_name, &other.job_company_name);
        fill(&mut self.job_company_website, &other.job_company_website);
        fill(&mut self.job_company_size, &other.job_company_size);
        fill(&mut self.industry, &other.industry);
        fill(&mut self.linkedin_url, &other.linkedin_url);
        fill(&mut self.location_name, &other.location_name);
        fill(&mut self.location_locality, &other.location_locality);
        fill(&mut self.mobile_phone, &other.mobile_phone);
        fill(&mut self.work_email, &other.work_email);
        fill_list(&mut self.phone_numbers, &other.phone_numbers);
        fill_list(&mut self.personal_emails, &other.personal_emails);
        fill_list(&mut self.emails, &other.emails);
    }
}

/// A PDL hit: the person plus the provider-reported likelihood (1-10)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdlMatch {
    pub likelihood: i32,
    pub person: PdlPerson,
}

/// Person returned by the graph-lookup provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApolloPerson {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub seniority: Option<String>,
    pub phone_numbers: Vec<String>,
    pub organization_name: Option<String>,
    pub organization_industry: Option<String>,
    pub organization_website: Option<String>,
}

/// Organization returned by the graph-lookup provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApolloOrg {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    pub estimated_num_employees: Option<u32>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// One property-ownership row from the municipal dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    pub borough: String,
    pub units: u32,
    pub assessed_value: f64,
    pub owner_name: String,
    pub parcel_id: String,
}
