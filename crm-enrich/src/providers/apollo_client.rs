//! Apollo person and organization client
//!
//! - Person: `POST /api/v1/people/match`
//! - Organization: `POST /api/v1/mixed_companies/search` by name, first hit
//!
//! Wire shapes are mapped into the flat `ApolloPerson` / `ApolloOrg` domain
//! types right here so nothing downstream depends on Apollo's JSON layout.

use super::{
    http_client, rate_limiter, GraphProvider, PersonLookup, ProviderError, ProviderRateLimiter,
};
use crate::types::{non_empty, ApolloOrg, ApolloPerson};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const APOLLO_BASE_URL: &str = "https://api.apollo.io/api/v1";
const APOLLO_REQUESTS_PER_SECOND: u32 = 5;

#[derive(Debug, Deserialize)]
struct PeopleMatchResponse {
    person: Option<WirePerson>,
}

#[derive(Debug, Default, Deserialize)]
struct WirePerson {
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    title: Option<String>,
    email: Option<String>,
    linkedin_url: Option<String>,
    city: Option<String>,
    state: Option<String>,
    seniority: Option<String>,
    #[serde(default)]
    phone_numbers: Option<Vec<WirePhone>>,
    organization: Option<WireOrganization>,
}

#[derive(Debug, Deserialize)]
struct WirePhone {
    raw_number: Option<String>,
    sanitized_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireOrganization {
    name: Option<String>,
    industry: Option<String>,
    website_url: Option<String>,
    estimated_num_employees: Option<u32>,
    phone: Option<String>,
    linkedin_url: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompanySearchResponse {
    #[serde(default)]
    organizations: Option<Vec<WireOrganization>>,
}

impl From<WirePerson> for ApolloPerson {
    fn from(wire: WirePerson) -> Self {
        let name = wire.name.or_else(|| {
            let joined = [wire.first_name.as_deref(), wire.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            non_empty(Some(joined.as_str())).map(str::to_string)
        });

        let phone_numbers = wire
            .phone_numbers
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.sanitized_number.or(p.raw_number))
            .filter(|p| !p.trim().is_empty())
            .collect();

        let organization = wire.organization.unwrap_or_default();

        ApolloPerson {
            name,
            title: wire.title,
            email: wire.email,
            linkedin_url: wire.linkedin_url,
            city: wire.city,
            state: wire.state,
            seniority: wire.seniority,
            phone_numbers,
            organization_name: organization.name,
            organization_industry: organization.industry,
            organization_website: organization.website_url,
        }
    }
}

impl From<WireOrganization> for ApolloOrg {
    fn from(wire: WireOrganization) -> Self {
        ApolloOrg {
            name: wire.name,
            industry: wire.industry,
            website_url: wire.website_url,
            estimated_num_employees: wire.estimated_num_employees,
            phone: wire.phone,
            linkedin_url: wire.linkedin_url,
            city: wire.city,
            state: wire.state,
        }
    }
}

/// Parse a people/match body; `"person": null` means no match
pub fn parse_person_response(body: &str) -> Result<Option<ApolloPerson>, ProviderError> {
    let response: PeopleMatchResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(response.person.map(ApolloPerson::from))
}

/// Parse a company search body, keeping the first organization
pub fn parse_organization_response(body: &str) -> Result<Option<ApolloOrg>, ProviderError> {
    let response: CompanySearchResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(response
        .organizations
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(ApolloOrg::from))
}

/// Request body for a person match
pub fn person_match_body(lookup: &PersonLookup) -> serde_json::Value {
    let mut tokens = lookup.name.split_whitespace();
    let first_name = tokens.next().unwrap_or_default();
    let last_name = tokens.collect::<Vec<_>>().join(" ");

    let mut body = json!({
        "name": lookup.name,
        "first_name": first_name,
        "last_name": last_name,
        "reveal_personal_emails": false,
    });
    if let Some(city) = &lookup.city {
        body["city"] = json!(city);
    }
    if let Some(company) = &lookup.company {
        body["organization_name"] = json!(company);
    }
    if let Some(email) = &lookup.email {
        body["email"] = json!(email);
    }
    body
}

/// Apollo API client
pub struct ApolloClient {
    api_key: String,
    http_client: reqwest::Client,
    rate_limiter: ProviderRateLimiter,
}

impl ApolloClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Ok(Self {
            api_key,
            http_client: http_client()?,
            rate_limiter: rate_limiter(APOLLO_REQUESTS_PER_SECOND),
        })
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Option<String>, ProviderError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", APOLLO_BASE_URL, path);
        let response = self
            .http_client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .header("Cache-Control", "no-cache")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        Ok(Some(response.text().await?))
    }
}

#[async_trait]
impl GraphProvider for ApolloClient {
    fn source_id(&self) -> &'static str {
        "apollo"
    }

    async fn enrich_person(
        &self,
        lookup: &PersonLookup,
    ) -> Result<Option<ApolloPerson>, ProviderError> {
        debug!(has_company = lookup.company.is_some(), "Querying Apollo people/match");
        match self.post("people/match", &person_match_body(lookup)).await? {
            Some(body) => parse_person_response(&body),
            None => Ok(None),
        }
    }

    async fn enrich_organization(&self, name: &str) -> Result<Option<ApolloOrg>, ProviderError> {
        debug!(organization = %name, "Querying Apollo company search");
        let body = json!({
            "q_organization_name": name,
            "page": 1,
            "per_page": 1,
        });
        match self.post("mixed_companies/search", &body).await? {
            Some(body) => parse_organization_response(&body),
            None => Ok(None),
        }
    }
}
