//! Configuration module for Sumi-Frontier
//!
//! This module handles loading, parsing, and validating the frontier's TOML
//! settings file.
//!
//! # Example
//!
//! ```no_run
//! use sumi_frontier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("frontier.toml")).unwrap();
//! println!("Whitelisted hosts: {}", config.whitelist.len());
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, FrontierConfig, WhitelistEntry, DEFAULT_HOST_CAPACITY, DEFAULT_OVERFLOW_CAPACITY,
    DEFAULT_PRIORITY_CAPACITY,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
