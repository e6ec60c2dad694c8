//! Agent commission split resolution
//!
//! Resolves the split stored for an agent. There is no built-in default: a
//! missing or malformed plan is an error and the caller picks the fallback
//! (usually [`CommissionSplit::STANDARD`]).

use crate::db::commission_plans::{self, CommissionPlan};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

/// Tolerance when checking that splits add up to 100%
const SPLIT_SUM_TOLERANCE: f64 = 0.01;

/// Agent / house percentages of a commission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub agent_pct: f64,
    pub house_pct: f64,
}

impl CommissionSplit {
    /// Brokerage standard split: 70% agent, 30% house
    pub const STANDARD: CommissionSplit = CommissionSplit {
        agent_pct: 70.0,
        house_pct: 30.0,
    };
}

#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("No commission plan for agent {0}")]
    NoPlan(String),

    #[error("Invalid commission plan for agent {agent_id}: {reason}")]
    InvalidPlan { agent_id: String, reason: String },

    #[error("Commission plan lookup failed: {0}")]
    Database(#[from] crm_common::Error),
}

/// Check a stored plan: each side within 0-100 and summing to 100
pub fn validate_plan(plan: &CommissionPlan) -> Result<CommissionSplit, CommissionError> {
    let invalid = |reason: String| CommissionError::InvalidPlan {
        agent_id: plan.agent_id.clone(),
        reason,
    };

    for (side, pct) in [("agent", plan.agent_split_pct), ("house", plan.house_split_pct)] {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(invalid(format!("{} split {} out of range", side, pct)));
        }
    }

    let sum = plan.agent_split_pct + plan.house_split_pct;
    if (sum - 100.0).abs() > SPLIT_SUM_TOLERANCE {
        return Err(invalid(format!("splits sum to {}", sum)));
    }

    Ok(CommissionSplit {
        agent_pct: plan.agent_split_pct,
        house_pct: plan.house_split_pct,
    })
}

/// Resolve the split configured for `agent_id`
pub async fn resolve_agent_split(
    pool: &SqlitePool,
    agent_id: &str,
) -> Result<CommissionSplit, CommissionError> {
    let plan = commission_plans::load_plan(pool, agent_id)
        .await?
        .ok_or_else(|| CommissionError::NoPlan(agent_id.to_string()))?;

    validate_plan(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::commission_plans::save_plan;
    use crate::db::init_memory_pool;

    fn plan(agent: f64, house: f64) -> CommissionPlan {
        CommissionPlan {
            agent_id: "agent-1".to_string(),
            agent_split_pct: agent,
            house_split_pct: house,
        }
    }

    #[tokio::test]
    async fn test_resolve_stored_plan() {
        let pool = init_memory_pool().await.unwrap();
        save_plan(&pool, &plan(80.0, 20.0)).await.unwrap();

        let split = resolve_agent_split(&pool, "agent-1").await.unwrap();
        assert_eq!(split, CommissionSplit { agent_pct: 80.0, house_pct: 20.0 });
    }

    #[tokio::test]
    async fn test_missing_plan_is_error_not_default() {
        let pool = init_memory_pool().await.unwrap();
        let result = resolve_agent_split(&pool, "agent-404").await;
        assert!(matches!(result, Err(CommissionError::NoPlan(id)) if id == "agent-404"));
    }

    #[test]
    fn test_validate_rejects_bad_sums_and_ranges() {
        assert!(matches!(
            validate_plan(&plan(70.0, 20.0)),
            Err(CommissionError::InvalidPlan { .. })
        ));
        assert!(matches!(
            validate_plan(&plan(120.0, -20.0)),
            Err(CommissionError::InvalidPlan { .. })
        ));
        assert!(validate_plan(&plan(62.5, 37.5)).is_ok());
    }
}
