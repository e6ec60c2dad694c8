//! People Data Labs person enrichment client
//!
//! `GET /v5/person/enrich` with the query as URL parameters and the key in
//! the `X-Api-Key` header. HTTP 200 carries `{likelihood, data}`; any other
//! status means no match.

use super::{
    http_client, rate_limiter, IdentityProvider, IdentityQuery, ProviderError, ProviderRateLimiter,
};
use crate::types::{PdlMatch, PdlPerson};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

const PDL_ENRICH_URL: &str = "https://api.peopledatalabs.com/v5/person/enrich";
const PDL_REQUESTS_PER_SECOND: u32 = 10;

#[derive(Debug, Deserialize)]
struct PdlEnrichResponse {
    #[serde(default)]
    likelihood: i32,
    data: Option<PdlPerson>,
}

/// Parse a 200 response body into a match
///
/// A body without `data` is treated as no match.
pub fn parse_enrich_response(body: &str) -> Result<Option<PdlMatch>, ProviderError> {
    let response: PdlEnrichResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    Ok(response.data.map(|person| PdlMatch {
        likelihood: response.likelihood,
        person,
    }))
}

/// People Data Labs API client
pub struct PdlClient {
    api_key: String,
    http_client: reqwest::Client,
    rate_limiter: ProviderRateLimiter,
}

impl PdlClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Ok(Self {
            api_key,
            http_client: http_client()?,
            rate_limiter: rate_limiter(PDL_REQUESTS_PER_SECOND),
        })
    }
}

#[async_trait]
impl IdentityProvider for PdlClient {
    fn source_id(&self) -> &'static str {
        "pdl"
    }

    async fn enrich_person(
        &self,
        query: &IdentityQuery,
    ) -> Result<Option<PdlMatch>, ProviderError> {
        self.rate_limiter.until_ready().await;

        let params = query.to_query_pairs();
        debug!(
            min_likelihood = query.min_likelihood,
            direct = query.has_direct_identifier(),
            "Querying PDL person enrichment"
        );

        let response = self
            .http_client
            .get(PDL_ENRICH_URL)
            .header("X-Api-Key", &self.api_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "PDL returned no match");
            return Ok(None);
        }

        let body = response.text().await?;
        let found = parse_enrich_response(&body)?;

        if let Some(found) = &found {
            info!(
                likelihood = found.likelihood,
                has_title = found.person.job_title.is_some(),
                "PDL match found"
            );
        }

        Ok(found)
    }
}
