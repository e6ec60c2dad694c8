//! # CRM Common Library
//!
//! Shared code for the brokerage CRM services including:
//! - Error types
//! - Bootstrap configuration loading and root folder resolution
//! - Event types (CrmEvent enum) and the EventBus
//! - Server-Sent Events helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
