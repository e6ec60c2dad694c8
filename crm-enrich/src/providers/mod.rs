//! External enrichment providers
//!
//! Each provider is a black-box collaborator behind a trait so the pipeline
//! can be driven by the HTTP clients in production and by fakes in tests.
//!
//! Providers:
//! - Identity enrichment (People Data Labs)
//! - Person / organization graph lookup (Apollo)
//! - Property ownership records (NYC PLUTO via Socrata)

use crate::types::{ApolloOrg, ApolloPerson, PdlMatch, PropertyRecord};
use async_trait::async_trait;
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

pub mod apollo_client;
pub mod pdl_client;
pub mod pluto_client;

pub use apollo_client::ApolloClient;
pub use pdl_client::PdlClient;
pub use pluto_client::PlutoClient;

/// Timeout applied to every provider request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("crm-enrich/", env!("CARGO_PKG_VERSION"));

/// Provider client errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Query sent to the identity-enrichment provider
///
/// Direct identifiers are `email` and `phone`; the rest narrow a name search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub min_likelihood: i32,
}

impl IdentityQuery {
    pub fn has_direct_identifier(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }

    /// Query string pairs in a stable order, omitting unset fields
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let optional = [
            ("email", &self.email),
            ("phone", &self.phone),
            ("name", &self.name),
            ("locality", &self.locality),
            ("region", &self.region),
            ("street_address", &self.street_address),
            ("postal_code", &self.postal_code),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs.push(("min_likelihood", self.min_likelihood.to_string()));
        pairs
    }
}

/// Inputs for a graph person lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonLookup {
    pub name: String,
    pub city: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
}

/// Identity-enrichment provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider identifier for logs
    fn source_id(&self) -> &'static str;

    /// Look up a person
    ///
    /// * `Ok(Some(_))` - match with provider likelihood
    /// * `Ok(None)` - provider found no match
    /// * `Err(_)` - request failed (callers degrade to "no data")
    async fn enrich_person(&self, query: &IdentityQuery) -> Result<Option<PdlMatch>, ProviderError>;
}

/// Person and organization graph provider
#[async_trait]
pub trait GraphProvider: Send + Sync {
    fn source_id(&self) -> &'static str;

    async fn enrich_person(
        &self,
        lookup: &PersonLookup,
    ) -> Result<Option<ApolloPerson>, ProviderError>;

    async fn enrich_organization(&self, name: &str) -> Result<Option<ApolloOrg>, ProviderError>;
}

/// Public property-ownership records
#[async_trait]
pub trait PropertyRecordsProvider: Send + Sync {
    fn source_id(&self) -> &'static str;

    /// Properties whose owner name contains `full_name` (case-insensitive)
    async fn find_by_owner(&self, full_name: &str) -> Result<Vec<PropertyRecord>, ProviderError>;
}

/// Direct (unkeyed) rate limiter used by every provider client
pub type ProviderRateLimiter = governor::DefaultDirectRateLimiter;

/// Build a limiter allowing `per_second` requests per second
pub(crate) fn rate_limiter(per_second: u32) -> ProviderRateLimiter {
    let quota = governor::Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
    governor::RateLimiter::direct(quota)
}

/// Shared HTTP client settings for provider clients
pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_unset_fields() {
        let query = IdentityQuery {
            name: Some("Ada Lovelace".to_string()),
            locality: Some("Brooklyn".to_string()),
            min_likelihood: 2,
            ..Default::default()
        };

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("name", "Ada Lovelace".to_string()),
                ("locality", "Brooklyn".to_string()),
                ("min_likelihood", "2".to_string()),
            ]
        );
        assert!(!query.has_direct_identifier());
    }

    #[test]
    fn test_direct_identifier_detection() {
        let query = IdentityQuery {
            phone: Some("2125550100".to_string()),
            min_likelihood: 3,
            ..Default::default()
        };
        assert!(query.has_direct_identifier());
    }

    #[test]
    fn test_rate_limiter_allows_first_request() {
        let limiter = rate_limiter(5);
        assert!(limiter.check().is_ok());
    }
}
