//! NYC PLUTO property ownership lookup
//!
//! Socrata SoQL query against the NYC Open Data PLUTO dataset. Socrata
//! returns every column as a string, so numeric columns are parsed leniently.

use super::{http_client, rate_limiter, PropertyRecordsProvider, ProviderError, ProviderRateLimiter};
use crate::types::PropertyRecord;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

const PLUTO_DATASET_URL: &str = "https://data.cityofnewyork.us/resource/64uk-42ks.json";
const PLUTO_REQUESTS_PER_SECOND: u32 = 4;

/// Maximum rows returned per owner lookup
pub const MAX_PROPERTY_ROWS: u32 = 10;

#[derive(Debug, Deserialize)]
struct PlutoRow {
    address: Option<String>,
    borough: Option<String>,
    unitsres: Option<String>,
    assesstot: Option<String>,
    ownername: Option<String>,
    bbl: Option<String>,
}

impl From<PlutoRow> for PropertyRecord {
    fn from(row: PlutoRow) -> Self {
        PropertyRecord {
            address: row.address.unwrap_or_default(),
            borough: row.borough.unwrap_or_default(),
            units: parse_units(row.unitsres.as_deref()),
            assessed_value: parse_amount(row.assesstot.as_deref()),
            owner_name: row.ownername.unwrap_or_default(),
            parcel_id: row.bbl.unwrap_or_default(),
        }
    }
}

/// "12" / "12.0" → 12; anything unparseable → 0
fn parse_units(value: Option<&str>) -> u32 {
    parse_amount(value).max(0.0) as u32
}

fn parse_amount(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Upper-cased owner name safe to embed in a SoQL `like` literal
///
/// SoQL `like` has no escape clause, so the `%` and `_` wildcards are
/// treated as word breaks. Quotes are doubled.
fn like_needle(full_name: &str) -> String {
    full_name
        .replace(['%', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .replace('\'', "''")
}

/// SoQL parameters for a case-insensitive owner-name substring match
pub fn owner_query(full_name: &str) -> Vec<(&'static str, String)> {
    let needle = like_needle(full_name);
    vec![
        ("$select", "address,borough,unitsres,assesstot,ownername,bbl".to_string()),
        ("$where", format!("upper(ownername) like '%{}%'", needle)),
        ("$order", "unitsres DESC".to_string()),
        ("$limit", MAX_PROPERTY_ROWS.to_string()),
    ]
}

/// Parse the JSON array returned by Socrata
pub fn parse_rows(body: &str) -> Result<Vec<PropertyRecord>, ProviderError> {
    let rows: Vec<PlutoRow> =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(rows.into_iter().map(PropertyRecord::from).collect())
}

/// NYC Open Data PLUTO client
pub struct PlutoClient {
    app_token: Option<String>,
    http_client: reqwest::Client,
    rate_limiter: ProviderRateLimiter,
}

impl PlutoClient {
    /// `app_token` is optional; without it Socrata applies a shared quota
    pub fn new(app_token: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            app_token,
            http_client: http_client()?,
            rate_limiter: rate_limiter(PLUTO_REQUESTS_PER_SECOND),
        })
    }
}

#[async_trait]
impl PropertyRecordsProvider for PlutoClient {
    fn source_id(&self) -> &'static str {
        "nyc_pluto"
    }

    async fn find_by_owner(&self, full_name: &str) -> Result<Vec<PropertyRecord>, ProviderError> {
        self.rate_limiter.until_ready().await;

        let mut request = self.http_client.get(PLUTO_DATASET_URL).query(&owner_query(full_name));
        if let Some(token) = &self.app_token {
            request = request.header("X-App-Token", token);
        }

        debug!("Querying PLUTO ownership records");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let records = parse_rows(&response.text().await?)?;
        info!(count = records.len(), "PLUTO ownership records retrieved");
        Ok(records)
    }
}
