//! Two-pass identity resolution against the identity-enrichment provider
//!
//! Pass 1 uses the strongest direct identifier (email, else phone). When it
//! finds nothing, or only a sparse record, pass 2 ("deep search") retries by
//! name and location alone and the two results are merged.

use crate::providers::{IdentityProvider, IdentityQuery};
use crate::types::{non_empty, Contact, PdlMatch};
use tracing::{debug, info, warn};

/// Minimum likelihood for a query carrying a direct identifier
pub const STRICT_MIN_LIKELIHOOD: i32 = 3;

/// Minimum likelihood for a name-only search when no direct identifier exists
pub const RELAXED_MIN_LIKELIHOOD: i32 = 2;

/// Outcome of identity resolution for one contact
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityResolution {
    /// Merged match, if either pass found one
    pub matched: Option<PdlMatch>,

    /// True when the retry pass produced (or contributed to) the match
    pub deep_search_match: bool,

    /// Provider requests issued
    pub requests: usize,
}

impl IdentityResolution {
    pub fn found(&self) -> bool {
        self.matched.is_some()
    }
}

fn location_fields(contact: &Contact, query: &mut IdentityQuery) {
    query.locality = contact.city().map(str::to_string);
    query.region = contact.state().map(str::to_string);
    query.street_address = contact.address().map(str::to_string);
    query.postal_code = contact.zip().map(str::to_string);
}

/// Pass 1 query, or None when the contact has no email and no phone
pub fn plan_primary_query(contact: &Contact) -> Option<IdentityQuery> {
    let mut query = IdentityQuery {
        min_likelihood: STRICT_MIN_LIKELIHOOD,
        ..Default::default()
    };

    if let Some(email) = contact.email() {
        query.email = Some(email.to_string());
    } else if let Some(phone) = contact.phone() {
        query.phone = Some(phone.to_string());
    } else {
        return None;
    }

    query.name = contact.full_name();
    location_fields(contact, &mut query);
    Some(query)
}

/// True when a match is absent or lacks phone, job title and LinkedIn alike
pub fn is_thin(found: Option<&PdlMatch>) -> bool {
    match found {
        None => true,
        Some(m) => {
            let person = &m.person;
            !person.has_phone()
                && non_empty(person.job_title.as_deref()).is_none()
                && non_empty(person.linkedin_url.as_deref()).is_none()
        }
    }
}

/// Name + location search without direct identifiers
///
/// Requires a two-token full name. The likelihood floor is relaxed only when
/// pass 1 never ran with a direct identifier.
pub fn plan_retry_query(contact: &Contact, used_direct_identifier: bool) -> Option<IdentityQuery> {
    let name = contact.two_token_name()?;

    let mut query = IdentityQuery {
        name: Some(name),
        min_likelihood: if used_direct_identifier {
            STRICT_MIN_LIKELIHOOD
        } else {
            RELAXED_MIN_LIKELIHOOD
        },
        ..Default::default()
    };
    location_fields(contact, &mut query);
    Some(query)
}

/// Merge two passes: the higher-likelihood match is the base and its empty
/// fields are backfilled from the other. Ties keep `primary` as the base.
pub fn merge_matches(primary: Option<PdlMatch>, retry: Option<PdlMatch>) -> Option<PdlMatch> {
    match (primary, retry) {
        (None, None) => None,
        (Some(m), None) | (None, Some(m)) => Some(m),
        (Some(primary), Some(retry)) => {
            let (mut base, other) = if retry.likelihood > primary.likelihood {
                (retry, primary)
            } else {
                (primary, retry)
            };
            base.person.backfill_from(&other.person);
            Some(base)
        }
    }
}

async fn run_query(
    provider: &dyn IdentityProvider,
    query: &IdentityQuery,
    pass: &'static str,
) -> Option<PdlMatch> {
    match provider.enrich_person(query).await {
        Ok(found) => found,
        Err(e) => {
            warn!(provider = provider.source_id(), pass, error = %e, "Identity lookup failed");
            None
        }
    }
}

/// Run pass 1, retry when it is empty or thin, and merge
pub async fn resolve_identity(
    provider: &dyn IdentityProvider,
    contact: &Contact,
) -> IdentityResolution {
    let mut resolution = IdentityResolution::default();

    let primary_query = plan_primary_query(contact);
    let used_direct = primary_query.is_some();

    let primary = match &primary_query {
        Some(query) => {
            resolution.requests += 1;
            run_query(provider, query, "primary").await
        }
        None => {
            debug!(contact_id = %contact.id, "No email or phone, skipping primary identity pass");
            None
        }
    };

    if !is_thin(primary.as_ref()) {
        resolution.matched = primary;
        return resolution;
    }

    let retry = match plan_retry_query(contact, used_direct) {
        Some(query) => {
            resolution.requests += 1;
            run_query(provider, &query, "deep_search").await
        }
        None => None,
    };

    resolution.deep_search_match = retry.is_some();
    resolution.matched = merge_matches(primary, retry);

    if let Some(m) = &resolution.matched {
        info!(
            contact_id = %contact.id,
            likelihood = m.likelihood,
            deep_search = resolution.deep_search_match,
            "Identity resolved"
        );
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::types::PdlPerson;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn contact() -> Contact {
        Contact {
            id: "c-1".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            city: Some("Brooklyn".to_string()),
            ..Default::default()
        }
    }

    fn hit(likelihood: i32, person: PdlPerson) -> PdlMatch {
        PdlMatch { likelihood, person }
    }

    #[test]
    fn test_primary_prefers_email_over_phone() {
        let mut c = contact();
        c.email = Some(" ada@engines.com ".to_string());
        c.phone = Some("212-555-0100".to_string());

        let query = plan_primary_query(&c).unwrap();
        assert_eq!(query.email.as_deref(), Some("ada@engines.com"));
        assert_eq!(query.phone, None);
        assert_eq!(query.min_likelihood, 3);
        assert_eq!(query.locality.as_deref(), Some("Brooklyn"));
    }

    #[test]
    fn test_primary_needs_direct_identifier() {
        assert!(plan_primary_query(&contact()).is_none());
    }

    #[test]
    fn test_retry_likelihood_floor() {
        let relaxed = plan_retry_query(&contact(), false).unwrap();
        assert_eq!(relaxed.min_likelihood, 2);
        assert!(!relaxed.has_direct_identifier());

        let strict = plan_retry_query(&contact(), true).unwrap();
        assert_eq!(strict.min_likelihood, 3);

        let mut single = contact();
        single.last_name = None;
        assert!(plan_retry_query(&single, false).is_none());
    }

    #[test]
    fn test_is_thin() {
        assert!(is_thin(None));
        assert!(is_thin(Some(&hit(9, PdlPerson::default()))));
        assert!(!is_thin(Some(&hit(
            9,
            PdlPerson {
                linkedin_url: Some("linkedin.com/in/ada".to_string()),
                ..Default::default()
            }
        ))));
    }

    #[test]
    fn test_merge_higher_likelihood_is_base() {
        let primary = hit(
            4,
            PdlPerson {
                job_title: Some("Agent".to_string()),
                industry: Some("real estate".to_string()),
                ..Default::default()
            },
        );
        let retry = hit(
            7,
            PdlPerson {
                job_title: Some("Broker".to_string()),
                ..Default::default()
            },
        );

        let merged = merge_matches(Some(primary), Some(retry)).unwrap();
        assert_eq!(merged.likelihood, 7);
        assert_eq!(merged.person.job_title.as_deref(), Some("Broker"));
        assert_eq!(merged.person.industry.as_deref(), Some("real estate"));
    }

    #[test]
    fn test_merge_tie_keeps_primary() {
        let primary = hit(
            5,
            PdlPerson {
                job_title: Some("Agent".to_string()),
                ..Default::default()
            },
        );
        let retry = hit(
            5,
            PdlPerson {
                job_title: Some("Broker".to_string()),
                ..Default::default()
            },
        );

        let merged = merge_matches(Some(primary), Some(retry)).unwrap();
        assert_eq!(merged.person.job_title.as_deref(), Some("Agent"));
    }

    struct Recording {
        queries: Mutex<Vec<IdentityQuery>>,
        response: Result<Option<PdlMatch>, ()>,
    }

    #[async_trait]
    impl IdentityProvider for Recording {
        fn source_id(&self) -> &'static str {
            "recording"
        }

        async fn enrich_person(
            &self,
            query: &IdentityQuery,
        ) -> Result<Option<PdlMatch>, ProviderError> {
            self.queries.lock().unwrap().push(query.clone());
            self.response.clone().map_err(|_| ProviderError::RateLimited)
        }
    }

    #[tokio::test]
    async fn test_name_only_contact_single_relaxed_request() {
        let provider = Recording {
            queries: Mutex::new(Vec::new()),
            response: Err(()),
        };

        let resolution = resolve_identity(&provider, &contact()).await;

        assert_eq!(resolution.requests, 1);
        assert!(!resolution.found());
        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].min_likelihood, 2);
        assert!(!queries[0].has_direct_identifier());
    }

    #[tokio::test]
    async fn test_rich_primary_skips_retry() {
        let mut c = contact();
        c.email = Some("ada@engines.com".to_string());
        let provider = Recording {
            queries: Mutex::new(Vec::new()),
            response: Ok(Some(hit(
                8,
                PdlPerson {
                    job_title: Some("Founder".to_string()),
                    ..Default::default()
                },
            ))),
        };

        let resolution = resolve_identity(&provider, &c).await;
        assert_eq!(resolution.requests, 1);
        assert!(resolution.found());
        assert!(!resolution.deep_search_match);
    }
}
