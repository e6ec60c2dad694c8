// Fusion Module - Multi-Source Contact Fusion
//
// Identity resolution (PDL two-pass) → contact channel dedup with provenance
// → single-valued field resolution in fixed provider precedence.

pub mod contact_fuser;
pub mod field_resolver;
pub mod identity_resolver;

pub use contact_fuser::{ContactChannels, ProvenanceMap};
pub use field_resolver::{FieldSource, FieldValue, ProfileField};
pub use identity_resolver::IdentityResolution;

use crate::types::{ApolloOrg, ApolloPerson, PdlPerson};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Everything known about a contact after fusing all providers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedProfile {
    /// Single-valued fields with the provider that supplied each
    pub fields: BTreeMap<ProfileField, FieldValue>,

    /// Deduplicated emails/phones with provenance
    pub channels: ContactChannels,
}

impl MergedProfile {
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.fields.get(&field).map(|v| v.value.as_str())
    }

    /// Fraction of profile fields resolved (0.0-1.0)
    pub fn completeness(&self) -> f64 {
        self.fields.len() as f64 / ProfileField::ALL.len() as f64
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.channels.is_empty()
    }
}

/// Fuse provider results into one profile
///
/// Precedence for single-valued fields: Apollo person → Apollo org → PDL.
pub fn fuse_profile(
    pdl: Option<&PdlPerson>,
    apollo_person: Option<&ApolloPerson>,
    apollo_org: Option<&ApolloOrg>,
) -> MergedProfile {
    let sources = field_resolver::ordered_sources(apollo_person, apollo_org, pdl);

    let fields: BTreeMap<ProfileField, FieldValue> = ProfileField::ALL
        .iter()
        .filter_map(|field| {
            field_resolver::resolve_field(*field, &sources).map(|value| (*field, value))
        })
        .collect();

    let channels = contact_fuser::fuse_channels(pdl, apollo_person);

    let profile = MergedProfile { fields, channels };

    debug!(
        fields = profile.fields.len(),
        emails = profile.channels.emails.len(),
        phones = profile.channels.phones.len(),
        "Profile fusion complete ({:.0}% complete)",
        profile.completeness() * 100.0
    );

    profile
}
