//! Shared test helpers: scripted providers and seeded databases

#![allow(dead_code)]

use async_trait::async_trait;
use crm_enrich::providers::{
    GraphProvider, IdentityProvider, IdentityQuery, PersonLookup, PropertyRecordsProvider,
    ProviderError,
};
use crm_enrich::types::{ApolloOrg, ApolloPerson, Contact, PdlMatch, PdlPerson, PropertyRecord};
use crm_enrich::workflow::Providers;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

/// Identity provider answering from a script, one response per call
///
/// Once the script is exhausted every further call returns "no match".
#[derive(Default)]
pub struct ScriptedIdentity {
    pub responses: Mutex<Vec<Result<Option<PdlMatch>, ProviderError>>>,
    pub queries: Mutex<Vec<IdentityQuery>>,
}

impl ScriptedIdentity {
    pub fn new(responses: Vec<Result<Option<PdlMatch>, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<IdentityQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    fn source_id(&self) -> &'static str {
        "scripted_pdl"
    }

    async fn enrich_person(
        &self,
        query: &IdentityQuery,
    ) -> Result<Option<PdlMatch>, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses.lock().unwrap().pop().unwrap_or(Ok(None))
    }
}

/// Graph provider returning fixed person / organization answers
#[derive(Default)]
pub struct FixedGraph {
    pub person: Option<ApolloPerson>,
    pub organization: Option<ApolloOrg>,
    pub fail: bool,
    pub person_lookups: Mutex<Vec<PersonLookup>>,
    pub organization_lookups: Mutex<Vec<String>>,
}

#[async_trait]
impl GraphProvider for FixedGraph {
    fn source_id(&self) -> &'static str {
        "fixed_apollo"
    }

    async fn enrich_person(
        &self,
        lookup: &PersonLookup,
    ) -> Result<Option<ApolloPerson>, ProviderError> {
        self.person_lookups.lock().unwrap().push(lookup.clone());
        if self.fail {
            return Err(ProviderError::Api(500, "boom".to_string()));
        }
        Ok(self.person.clone())
    }

    async fn enrich_organization(&self, name: &str) -> Result<Option<ApolloOrg>, ProviderError> {
        self.organization_lookups.lock().unwrap().push(name.to_string());
        if self.fail {
            return Err(ProviderError::Network("connection reset".to_string()));
        }
        Ok(self.organization.clone())
    }
}

/// Property records provider returning a fixed list
#[derive(Default)]
pub struct FixedRecords {
    pub records: Vec<PropertyRecord>,
    pub fail: bool,
}

#[async_trait]
impl PropertyRecordsProvider for FixedRecords {
    fn source_id(&self) -> &'static str {
        "fixed_pluto"
    }

    async fn find_by_owner(&self, _full_name: &str) -> Result<Vec<PropertyRecord>, ProviderError> {
        if self.fail {
            return Err(ProviderError::RateLimited);
        }
        Ok(self.records.clone())
    }
}

/// Property records provider that deletes the contact while it is queried
pub struct DeletingRecords {
    pub db: SqlitePool,
    pub contact_id: String,
}

#[async_trait]
impl PropertyRecordsProvider for DeletingRecords {
    fn source_id(&self) -> &'static str {
        "deleting_pluto"
    }

    async fn find_by_owner(&self, _full_name: &str) -> Result<Vec<PropertyRecord>, ProviderError> {
        sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(&self.contact_id)
            .execute(&self.db)
            .await
            .unwrap();
        Ok(Vec::new())
    }
}

pub fn providers(
    identity: Option<Arc<ScriptedIdentity>>,
    graph: Option<Arc<FixedGraph>>,
    records: Option<Arc<FixedRecords>>,
) -> Providers {
    Providers {
        identity: identity.map(|p| p as Arc<dyn IdentityProvider>),
        graph: graph.map(|p| p as Arc<dyn GraphProvider>),
        records: records.map(|p| p as Arc<dyn PropertyRecordsProvider>),
    }
}

pub fn named_contact(id: &str) -> Contact {
    Contact {
        id: id.to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        city: Some("Brooklyn".to_string()),
        state: Some("NY".to_string()),
        ..Default::default()
    }
}

pub fn property(address: &str, units: u32) -> PropertyRecord {
    PropertyRecord {
        address: address.to_string(),
        borough: "BK".to_string(),
        units,
        assessed_value: 850_000.0,
        owner_name: "LOVELACE ADA".to_string(),
        parcel_id: format!("3-{}", address.len()),
    }
}

pub fn rich_pdl_match(likelihood: i32) -> PdlMatch {
    PdlMatch {
        likelihood,
        person: PdlPerson {
            full_name: Some("ada lovelace".to_string()),
            job_title: Some("managing partner".to_string()),
            job_company_name: Some("Analytical Engines LLC".to_string()),
            industry: Some("real estate".to_string()),
            linkedin_url: Some("linkedin.com/in/ada".to_string()),
            mobile_phone: Some("+1 212 555 0100".to_string()),
            work_email: Some("ada@engines.com".to_string()),
            ..Default::default()
        },
    }
}

/// In-memory database with the given contacts
pub async fn seeded_db(contacts: &[Contact]) -> SqlitePool {
    let pool = crm_enrich::db::init_memory_pool().await.unwrap();
    for contact in contacts {
        crm_enrich::db::contacts::save_contact(&pool, contact).await.unwrap();
    }
    pool
}
