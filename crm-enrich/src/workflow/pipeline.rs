//! Enrichment Pipeline
//!
//! Runs one contact through every enrichment stage and persists the result.
//!
//! # Stages
//! 1. **Load**: fetch the contact (the only fatal failure is "not found")
//! 2. **Identity**: PDL primary pass, conditional deep-search retry, merge
//! 3. **Graph**: Apollo person and organization lookups, joined concurrently
//! 4. **Fusion**: channel dedup with provenance, field precedence
//! 5. **Public records**: PLUTO ownership lookup by full name
//! 6. **Scoring**: engagement count + additive rules
//! 7. **Persist**: contact update + profile upsert
//!
//! # Error Handling
//! - Provider failures are logged and treated as "no data from this source"
//! - A failed database write still returns the computed report (`persisted: false`)
//! - Each run owns its state; concurrent runs for one contact race on the upsert

use crate::db::contacts::{self, ContactEnrichmentUpdate};
use crate::db::profiles::{self, EnrichmentProfile, PROFILE_VERSION};
use crate::fusion::identity_resolver::resolve_identity;
use crate::fusion::{fuse_profile, IdentityResolution, MergedProfile, ProfileField};
use crate::providers::{GraphProvider, IdentityProvider, PersonLookup, PropertyRecordsProvider};
use crate::scoring::{build_summary, score_lead, Grade, ScoringInput, Signal};
use crate::types::{ApolloOrg, ApolloPerson, Contact, PdlMatch, PropertyRecord};
use chrono::Utc;
use crm_common::events::{CrmEvent, EventBus};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Provider set used by the pipeline; unset providers are skipped
#[derive(Clone, Default)]
pub struct Providers {
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub graph: Option<Arc<dyn GraphProvider>>,
    pub records: Option<Arc<dyn PropertyRecordsProvider>>,
}

impl Providers {
    /// Names of configured providers, for health reporting
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if let Some(p) = &self.identity {
            names.push(p.source_id());
        }
        if let Some(p) = &self.graph {
            names.push(p.source_id());
        }
        if let Some(p) = &self.records {
            names.push(p.source_id());
        }
        names
    }
}

/// Fatal enrichment errors
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] crm_common::Error),
}

/// Result of one enrichment run
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub run_id: Uuid,
    pub contact_id: String,
    pub score: u32,
    pub grade: Grade,
    /// Every fired signal, highest points first
    pub signals: Vec<Signal>,
    pub summary: String,
    pub profile: MergedProfile,
    pub identity: Option<PdlMatch>,
    pub deep_search_match: bool,
    pub apollo_person: Option<ApolloPerson>,
    pub apollo_org: Option<ApolloOrg>,
    pub properties: Vec<PropertyRecord>,
    pub activity_count: i64,
    /// False when the database write failed
    pub persisted: bool,
}

/// Enrichment pipeline orchestrator
pub struct EnrichmentPipeline {
    db: SqlitePool,
    providers: Providers,
    event_bus: Option<EventBus>,
}

impl EnrichmentPipeline {
    pub fn new(db: SqlitePool, providers: Providers) -> Self {
        Self {
            db,
            providers,
            event_bus: None,
        }
    }

    /// Create pipeline that reports progress on the event bus
    pub fn with_events(db: SqlitePool, providers: Providers, event_bus: EventBus) -> Self {
        Self {
            db,
            providers,
            event_bus: Some(event_bus),
        }
    }

    fn emit(&self, event: CrmEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }

    fn emit_stage(&self, run_id: Uuid, contact_id: &str, stage: &str, found: bool) {
        self.emit(CrmEvent::EnrichmentStageCompleted {
            run_id,
            contact_id: contact_id.to_string(),
            stage: stage.to_string(),
            found,
            timestamp: Utc::now(),
        });
    }

    /// Enrich one contact end to end
    pub async fn enrich_contact(&self, contact_id: &str) -> Result<EnrichmentReport, EnrichError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, contact_id, "Enrichment started");
        self.emit(CrmEvent::EnrichmentStarted {
            run_id,
            contact_id: contact_id.to_string(),
            timestamp: Utc::now(),
        });

        // Stage 1: load
        let contact = match contacts::load_contact(&self.db, contact_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                warn!(%run_id, contact_id, "Contact not found");
                self.emit_failed(run_id, contact_id, "Contact not found");
                return Err(EnrichError::ContactNotFound(contact_id.to_string()));
            }
            Err(e) => {
                error!(%run_id, contact_id, error = %e, "Failed to load contact");
                self.emit_failed(run_id, contact_id, &e.to_string());
                return Err(EnrichError::Database(e));
            }
        };

        // Stage 2: identity
        let identity = self.identity_stage(&contact).await;
        self.emit_stage(run_id, contact_id, "identity", identity.found());

        // Stage 3: graph fan-out / fan-in
        let company = identity
            .matched
            .as_ref()
            .and_then(|m| crate::types::non_empty(m.person.job_company_name.as_deref()))
            .map(str::to_string)
            .or_else(|| contact.company_from_notes());
        let (apollo_person, apollo_org) = self.graph_stage(&contact, company.as_deref()).await;
        self.emit_stage(
            run_id,
            contact_id,
            "graph",
            apollo_person.is_some() || apollo_org.is_some(),
        );

        // Stage 4: fusion
        let profile = fuse_profile(
            identity.matched.as_ref().map(|m| &m.person),
            apollo_person.as_ref(),
            apollo_org.as_ref(),
        );

        // Stage 5: public records
        let properties = self.public_records_stage(&contact).await;
        self.emit_stage(run_id, contact_id, "public_records", !properties.is_empty());

        // Stage 6: scoring
        let activity_count = match contacts::count_activities(&self.db, contact_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    contact_id,
                    error = %e,
                    "Activity count unavailable, scoring without engagement"
                );
                0
            }
        };

        let organization_name = apollo_org
            .as_ref()
            .map(|org| org.name.as_deref().or(company.as_deref()).unwrap_or_default());
        let scoring_input = ScoringInput {
            identity_likelihood: identity.matched.as_ref().map(|m| m.likelihood),
            deep_search_match: identity.deep_search_match,
            apollo_person: apollo_person.as_ref(),
            organization_name,
            profile: &profile,
            properties: &properties,
            activity_count,
        };
        let lead = score_lead(&scoring_input);
        let summary = build_summary(&scoring_input);

        debug!(
            contact_id,
            score = lead.score,
            grade = %lead.grade,
            signals = lead.signals.len(),
            "Lead scored"
        );

        let mut report = EnrichmentReport {
            run_id,
            contact_id: contact_id.to_string(),
            score: lead.score,
            grade: lead.grade,
            signals: lead.signals,
            summary,
            profile,
            identity: identity.matched,
            deep_search_match: identity.deep_search_match,
            apollo_person,
            apollo_org,
            properties,
            activity_count,
            persisted: false,
        };

        // Stage 7: persist
        report.persisted = match self.persist(&report).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    %run_id,
                    contact_id,
                    error = %e,
                    "Failed to persist enrichment, returning unsaved report"
                );
                false
            }
        };

        info!(
            %run_id,
            contact_id,
            score = report.score,
            grade = %report.grade,
            persisted = report.persisted,
            "Enrichment completed"
        );
        self.emit(CrmEvent::EnrichmentCompleted {
            run_id,
            contact_id: contact_id.to_string(),
            score: report.score,
            grade: report.grade.to_string(),
            persisted: report.persisted,
            timestamp: Utc::now(),
        });

        Ok(report)
    }

    fn emit_failed(&self, run_id: Uuid, contact_id: &str, message: &str) {
        self.emit(CrmEvent::EnrichmentFailed {
            run_id,
            contact_id: contact_id.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    async fn identity_stage(&self, contact: &Contact) -> IdentityResolution {
        match &self.providers.identity {
            Some(provider) => resolve_identity(provider.as_ref(), contact).await,
            None => {
                debug!("No identity provider configured");
                IdentityResolution::default()
            }
        }
    }

    async fn graph_stage(
        &self,
        contact: &Contact,
        company: Option<&str>,
    ) -> (Option<ApolloPerson>, Option<ApolloOrg>) {
        let Some(graph) = &self.providers.graph else {
            debug!("No graph provider configured");
            return (None, None);
        };

        let person_lookup = contact.two_token_name().map(|name| PersonLookup {
            name,
            city: contact.city().map(str::to_string),
            company: company.map(str::to_string),
            email: contact.email().map(str::to_string),
        });

        let person = async {
            let lookup = person_lookup.as_ref()?;
            match graph.enrich_person(lookup).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(provider = graph.source_id(), error = %e, "Person lookup failed");
                    None
                }
            }
        };

        let organization = async {
            let name = company?;
            match graph.enrich_organization(name).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(provider = graph.source_id(), error = %e, "Organization lookup failed");
                    None
                }
            }
        };

        tokio::join!(person, organization)
    }

    async fn public_records_stage(&self, contact: &Contact) -> Vec<PropertyRecord> {
        let (Some(records), Some(name)) = (&self.providers.records, contact.two_token_name()) else {
            return Vec::new();
        };

        match records.find_by_owner(&name).await {
            Ok(found) => found,
            Err(e) => {
                warn!(provider = records.source_id(), error = %e, "Property records lookup failed");
                Vec::new()
            }
        }
    }

    async fn persist(&self, report: &EnrichmentReport) -> Result<(), crm_common::Error> {
        let now = Utc::now();
        let channels = &report.profile.channels;

        let updated = contacts::apply_enrichment(
            &self.db,
            &ContactEnrichmentUpdate {
                contact_id: report.contact_id.clone(),
                phone: channels.best_phone().map(str::to_string),
                email: channels.best_email().map(str::to_string),
                qualification_score: report.score,
                scored_at: now,
            },
        )
        .await?;
        if !updated {
            return Err(crm_common::Error::NotFound(format!(
                "Contact {} deleted during enrichment",
                report.contact_id
            )));
        }

        let field = |f: ProfileField| report.profile.get(f).map(str::to_string);
        let profile = EnrichmentProfile {
            id: profiles::profile_id(&report.contact_id),
            contact_id: report.contact_id.clone(),
            version: PROFILE_VERSION,
            full_name: field(ProfileField::FullName),
            job_title: field(ProfileField::JobTitle),
            employer: field(ProfileField::Company),
            industry: field(ProfileField::Industry),
            linkedin_url: field(ProfileField::LinkedinUrl),
            location: field(ProfileField::Location),
            phones: channels.phones.clone(),
            emails: channels.emails.clone(),
            raw_data: json!({
                "pdl": report.identity,
                "apollo_person": report.apollo_person,
                "apollo_org": report.apollo_org,
                "properties": report.properties,
                "fields": report.profile.fields,
                "provenance": {
                    "emails": channels.email_sources,
                    "phones": channels.phone_sources,
                },
            }),
            ai_summary: report.summary.clone(),
            ai_insights: report
                .signals
                .iter()
                .take(crate::scoring::TOP_SIGNAL_COUNT)
                .cloned()
                .collect(),
            lead_score: report.score,
            lead_grade: report.grade.to_string(),
            created_at: now,
            updated_at: now,
        };

        profiles::upsert_profile(&self.db, &profile).await
    }
}
