//! Configuration types and built-in defaults

use serde::Deserialize;

/// Main configuration structure for gridscout
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub enrichment: EnrichmentSection,
    pub checkpoint: CheckpointConfig,
    pub output: OutputConfig,
    pub proxy: ProxyConfig,

    /// Cookie header sent with every provider request; the reviews endpoint
    /// rejects anonymous requests
    pub cookies: Option<String>,
}

impl Config {
    /// Proxy URL, preferring the `GRIDSCOUT_PROXY` environment variable
    pub fn proxy_url(&self) -> Option<String> {
        if let Ok(url) = std::env::var("GRIDSCOUT_PROXY") {
            if !url.is_empty() {
                return Some(url);
            }
        }
        self.proxy.url()
    }

    /// Cookie header, preferring the `GRIDSCOUT_COOKIES` environment variable
    pub fn cookie_header(&self) -> Option<String> {
        if let Ok(cookies) = std::env::var("GRIDSCOUT_COOKIES") {
            if !cookies.is_empty() {
                return Some(cookies);
            }
        }
        self.cookies.clone()
    }
}

/// Search channel configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results requested per page
    #[serde(rename = "results-per-page")]
    pub results_per_page: u32,

    /// Viewport distance sent with each query (meters)
    #[serde(rename = "viewport-dist")]
    pub viewport_dist: u32,

    /// Base delay between requests on the search channel (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Hard ceiling on concurrent search workers
    #[serde(rename = "max-workers")]
    pub max_workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_page: 400,
            viewport_dist: 10_000,
            base_delay_ms: 50,
            max_workers: 50,
        }
    }
}

/// Enrichment channel configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentSection {
    /// Base delay between requests on the enrichment channel (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Reviews requested per page (provider caps at 20)
    #[serde(rename = "reviews-page-size")]
    pub reviews_page_size: u32,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            base_delay_ms: 300,
            reviews_page_size: 10,
        }
    }
}

/// Checkpointing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Save after every N newly accepted records during search
    pub interval: u64,

    /// Save after every N completed records during enrichment
    #[serde(rename = "enrichment-interval")]
    pub enrichment_interval: u64,

    /// Directory holding checkpoint files
    #[serde(rename = "state-dir")]
    pub state_dir: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 100,
            enrichment_interval: 50,
            state_dir: "output".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the JSON/JSONL result files
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
        }
    }
}

/// Proxy credentials; all three parts must be present for a proxy URL
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
}

impl ProxyConfig {
    pub fn url(&self) -> Option<String> {
        if self.host.is_empty() || self.user.is_empty() || self.pass.is_empty() {
            return None;
        }
        Some(format!("http://{}:{}@{}", self.user, self.pass, self.host))
    }
}
