//! Service modules outside the enrichment pipeline

pub mod commission;

pub use commission::{resolve_agent_split, CommissionError, CommissionSplit};
