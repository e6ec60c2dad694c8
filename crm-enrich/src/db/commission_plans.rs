//! Commission plan database operations

use chrono::Utc;
use crm_common::Result;
use sqlx::{Row, SqlitePool};

/// Stored split for one agent (percentages)
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionPlan {
    pub agent_id: String,
    pub agent_split_pct: f64,
    pub house_split_pct: f64,
}

pub async fn save_plan(pool: &SqlitePool, plan: &CommissionPlan) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO commission_plans (agent_id, agent_split_pct, house_split_pct, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(agent_id) DO UPDATE SET
            agent_split_pct = excluded.agent_split_pct,
            house_split_pct = excluded.house_split_pct,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&plan.agent_id)
    .bind(plan.agent_split_pct)
    .bind(plan.house_split_pct)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_plan(pool: &SqlitePool, agent_id: &str) -> Result<Option<CommissionPlan>> {
    let row = sqlx::query(
        "SELECT agent_id, agent_split_pct, house_split_pct
         FROM commission_plans WHERE agent_id = ?",
    )
    .bind(agent_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| CommissionPlan {
        agent_id: row.get("agent_id"),
        agent_split_pct: row.get("agent_split_pct"),
        house_split_pct: row.get("house_split_pct"),
    }))
}
