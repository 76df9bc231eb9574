//! Run configuration
//!
//! Every component takes its settings from one [`Config`] value constructed
//! at startup (defaults, optionally overlaid by a TOML file) and passed by
//! reference into the engine. Nothing reads ambient global state except the
//! documented environment overrides for credentials.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    CheckpointConfig, Config, EnrichmentSection, OutputConfig, ProxyConfig, SearchConfig,
};
pub use validation::validate;
