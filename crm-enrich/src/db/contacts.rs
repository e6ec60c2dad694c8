//! Contact database operations

use crate::types::{Contact, EnrichmentStatus};
use chrono::{DateTime, Utc};
use crm_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields written back to a contact after enrichment
#[derive(Debug, Clone)]
pub struct ContactEnrichmentUpdate {
    pub contact_id: String,
    /// Applied only if the stored phone is empty
    pub phone: Option<String>,
    /// Applied only if the stored email is empty
    pub email: Option<String>,
    pub qualification_score: u32,
    pub scored_at: DateTime<Utc>,
}

/// Insert or replace a contact
pub async fn save_contact(pool: &SqlitePool, contact: &Contact) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contacts (
            id, organization_id, first_name, last_name, email, phone,
            address, city, state, zip, notes,
            qualification_score, score_updated_at, enrichment_status
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            organization_id = excluded.organization_id,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            phone = excluded.phone,
            address = excluded.address,
            city = excluded.city,
            state = excluded.state,
            zip = excluded.zip,
            notes = excluded.notes
        "#,
    )
    .bind(&contact.id)
    .bind(&contact.organization_id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.address)
    .bind(&contact.city)
    .bind(&contact.state)
    .bind(&contact.zip)
    .bind(&contact.notes)
    .bind(contact.qualification_score)
    .bind(contact.score_updated_at)
    .bind(
        contact
            .enrichment_status
            .unwrap_or(EnrichmentStatus::NotEnriched)
            .as_str(),
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Load contact by id
pub async fn load_contact(pool: &SqlitePool, id: &str) -> Result<Option<Contact>> {
    let row = sqlx::query(
        r#"
        SELECT id, organization_id, first_name, last_name, email, phone,
               address, city, state, zip, notes,
               qualification_score, score_updated_at, enrichment_status
        FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let status: Option<String> = row.get("enrichment_status");

    Ok(Some(Contact {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        address: row.get("address"),
        city: row.get("city"),
        state: row.get("state"),
        zip: row.get("zip"),
        notes: row.get("notes"),
        qualification_score: row.get("qualification_score"),
        score_updated_at: row.try_get("score_updated_at")?,
        enrichment_status: Some(EnrichmentStatus::from_db(status.as_deref())),
    }))
}

/// Record an engagement activity; returns the new activity id
pub async fn record_activity(
    pool: &SqlitePool,
    contact_id: &str,
    activity_type: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO contact_activities (id, contact_id, activity_type, occurred_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(contact_id)
    .bind(activity_type)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Number of engagement activities recorded for a contact
pub async fn count_activities(pool: &SqlitePool, contact_id: &str) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM contact_activities WHERE contact_id = ?")
            .bind(contact_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Write enrichment results onto the contact
///
/// Phone and email are only filled when currently NULL or blank. Score,
/// score timestamp and status are always overwritten. Returns false when the
/// contact no longer exists.
pub async fn apply_enrichment(pool: &SqlitePool, update: &ContactEnrichmentUpdate) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE contacts SET
            phone = CASE WHEN phone IS NULL OR TRIM(phone) = ''
                THEN COALESCE(?, phone) ELSE phone END,
            email = CASE WHEN email IS NULL OR TRIM(email) = ''
                THEN COALESCE(?, email) ELSE email END,
            qualification_score = ?,
            score_updated_at = ?,
            enrichment_status = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.phone)
    .bind(&update.email)
    .bind(i64::from(update.qualification_score))
    .bind(update.scored_at)
    .bind(EnrichmentStatus::Enriched.as_str())
    .bind(&update.contact_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
