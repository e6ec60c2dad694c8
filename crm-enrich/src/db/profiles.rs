//! Enrichment profile database operations

use crate::scoring::Signal;
use chrono::{DateTime, Utc};
use crm_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

/// Profile format version; part of the deterministic profile id
pub const PROFILE_VERSION: i64 = 1;

/// Deterministic profile id for a contact: `<contactId>-v<version>`
pub fn profile_id(contact_id: &str) -> String {
    format!("{}-v{}", contact_id, PROFILE_VERSION)
}

/// Persisted enrichment profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentProfile {
    pub id: String,
    pub contact_id: String,
    pub version: i64,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub employer: Option<String>,
    pub industry: Option<String>,
    pub linkedin_url: Option<String>,
    pub location: Option<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    /// Raw provider payloads and provenance
    pub raw_data: serde_json::Value,
    pub ai_summary: String,
    /// Top signals by points
    pub ai_insights: Vec<Signal>,
    pub lead_score: u32,
    pub lead_grade: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Json(format!("Serialize profile failed: {}", e)))
}

fn from_json<T: for<'de> Deserialize<'de>>(column: &str, text: &str) -> Result<T> {
    serde_json::from_str(text)
        .map_err(|e| Error::Json(format!("Corrupt profile column {}: {}", column, e)))
}

/// Insert the profile, or overwrite everything but `created_at` if it exists
pub async fn upsert_profile(pool: &SqlitePool, profile: &EnrichmentProfile) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO enrichment_profiles (
            id, contact_id, version, full_name, job_title, employer, industry,
            linkedin_url, location, phones, emails, raw_data,
            ai_summary, ai_insights, lead_score, lead_grade, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            full_name = excluded.full_name,
            job_title = excluded.job_title,
            employer = excluded.employer,
            industry = excluded.industry,
            linkedin_url = excluded.linkedin_url,
            location = excluded.location,
            phones = excluded.phones,
            emails = excluded.emails,
            raw_data = excluded.raw_data,
            ai_summary = excluded.ai_summary,
            ai_insights = excluded.ai_insights,
            lead_score = excluded.lead_score,
            lead_grade = excluded.lead_grade,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.contact_id)
    .bind(profile.version)
    .bind(&profile.full_name)
    .bind(&profile.job_title)
    .bind(&profile.employer)
    .bind(&profile.industry)
    .bind(&profile.linkedin_url)
    .bind(&profile.location)
    .bind(to_json(&profile.phones)?)
    .bind(to_json(&profile.emails)?)
    .bind(to_json(&profile.raw_data)?)
    .bind(&profile.ai_summary)
    .bind(to_json(&profile.ai_insights)?)
    .bind(i64::from(profile.lead_score))
    .bind(&profile.lead_grade)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Highest-version profile for a contact
pub async fn latest_profile(
    pool: &SqlitePool,
    contact_id: &str,
) -> Result<Option<EnrichmentProfile>> {
    let row = sqlx::query(
        r#"
        SELECT id, contact_id, version, full_name, job_title, employer, industry,
               linkedin_url, location, phones, emails, raw_data,
               ai_summary, ai_insights, lead_score, lead_grade, created_at, updated_at
        FROM enrichment_profiles
        WHERE contact_id = ?
        ORDER BY version DESC
        LIMIT 1
        "#,
    )
    .bind(contact_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let phones: String = row.get("phones");
    let emails: String = row.get("emails");
    let raw_data: String = row.get("raw_data");
    let insights: String = row.get("ai_insights");
    let lead_score: i64 = row.get("lead_score");

    Ok(Some(EnrichmentProfile {
        id: row.get("id"),
        contact_id: row.get("contact_id"),
        version: row.get("version"),
        full_name: row.get("full_name"),
        job_title: row.get("job_title"),
        employer: row.get("employer"),
        industry: row.get("industry"),
        linkedin_url: row.get("linkedin_url"),
        location: row.get("location"),
        phones: from_json("phones", &phones)?,
        emails: from_json("emails", &emails)?,
        raw_data: from_json("raw_data", &raw_data)?,
        ai_summary: row.get("ai_summary"),
        ai_insights: from_json("ai_insights", &insights)?,
        lead_score: u32::try_from(lead_score).unwrap_or(0),
        lead_grade: row.get("lead_grade"),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    }))
}
