//! Sumi-Frontier: the crawl frontier of a search-indexing platform
//!
//! This crate decides which URL the fetch engine crawls next. Discovered links
//! are deduplicated against a per-host whitelist, compacted and stored in a
//! two-tier work queue (a small priority ring plus a large overflow stack).
//! Two dedicated threads handle admission and dispatch, with backpressure
//! applied by bounded, semaphore-gated buffers.

pub mod config;
pub mod frontier;
pub mod output;
pub mod state;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid exclusion pattern for {host}: {source}")]
    Pattern { host: String, source: regex::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host or pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Frontier operations
pub type Result<T> = std::result::Result<T, FrontierError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use frontier::{Admission, Filter, Frontier, UrlCompact};
pub use output::FrontierStatistics;
pub use url::{parse_link, resolve_link, LinkTarget};
