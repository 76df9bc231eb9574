//! Boundary resolution capability
//!
//! The default implementation queries the OpenStreetMap Nominatim search
//! endpoint. Bounding boxes arrive as `[south, north, west, east]` string
//! arrays; sub-region lookups use the `featureType` filter with the
//! categories the partitioner tries in order.

use crate::geo::{BoundaryBox, SubRegion};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";
const RESOLVER_USER_AGENT: &str = "gridscout/1.0";

/// Errors produced while resolving area names
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no results for area {area:?}")]
    NotFound { area: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed resolver response: {0}")]
    Malformed(String),
}

/// Capability: resolve an area name to a boundary box, and list named
/// sub-regions of an area for one administrative category.
pub trait BoundaryResolver: Send + Sync + 'static {
    fn resolve(
        &self,
        area: &str,
    ) -> impl Future<Output = Result<BoundaryBox, ResolveError>> + Send;

    fn sub_regions(
        &self,
        area: &str,
        category: &str,
    ) -> impl Future<Output = Result<Vec<SubRegion>, ResolveError>> + Send;
}

/// Production resolver backed by Nominatim
pub struct NominatimResolver {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimResolver {
    pub fn new(proxy_url: Option<&str>) -> Result<Self, ResolveError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(RESOLVER_USER_AGENT)
            .timeout(Duration::from_secs(30));

        if let Some(proxy) = proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: NOMINATIM_BASE.to_string(),
        })
    }

    /// Points the resolver at a different endpoint (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn search(&self, query: &[(&str, &str)]) -> Result<Value, ResolveError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ResolveError::Malformed(e.to_string()))
    }
}

impl BoundaryResolver for NominatimResolver {
    async fn resolve(&self, area: &str) -> Result<BoundaryBox, ResolveError> {
        let body = self
            .search(&[("q", area), ("format", "json"), ("limit", "1")])
            .await?;

        let entry = body
            .as_array()
            .and_then(|results| results.first())
            .ok_or_else(|| ResolveError::NotFound {
                area: area.to_string(),
            })?;

        // Use the caller's name rather than the display name so non-ASCII
        // provider names never leak into ids and file names
        let name = area.split(',').next().unwrap_or(area).trim();
        boundary_from_entry(entry, name)
    }

    async fn sub_regions(&self, area: &str, category: &str) -> Result<Vec<SubRegion>, ResolveError> {
        let body = self
            .search(&[
                ("q", area),
                ("format", "json"),
                ("featureType", category),
                ("limit", "30"),
            ])
            .await?;

        let entries = body
            .as_array()
            .ok_or_else(|| ResolveError::Malformed("expected result array".to_string()))?;

        let mut regions = Vec::new();
        for entry in entries {
            let display_name = match entry.get("display_name").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let short = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_else(|| display_name.split(',').next().unwrap_or(&display_name))
                .trim()
                .replace(' ', "_");

            if let Ok(boundary) = boundary_from_entry(entry, &display_name) {
                regions.push(SubRegion {
                    name: short,
                    display_name,
                    boundary,
                });
            }
        }

        Ok(regions)
    }
}

/// Parses a Nominatim `boundingbox` field: `[south, north, west, east]`
fn boundary_from_entry(entry: &Value, name: &str) -> Result<BoundaryBox, ResolveError> {
    let bbox = entry
        .get("boundingbox")
        .and_then(Value::as_array)
        .filter(|b| b.len() == 4)
        .ok_or_else(|| ResolveError::Malformed("missing boundingbox".to_string()))?;

    let mut edges = [0.0f64; 4];
    for (i, edge) in bbox.iter().enumerate() {
        edges[i] = edge
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| edge.as_f64())
            .ok_or_else(|| ResolveError::Malformed("non-numeric boundingbox edge".to_string()))?;
    }

    Ok(BoundaryBox::new(name, edges[1], edges[0], edges[3], edges[2]))
}
