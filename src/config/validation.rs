use crate::config::types::{Config, FrontierConfig, WhitelistEntry};
use crate::url::{parse_link, LinkTarget};
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_frontier_config(&config.frontier)?;
    validate_whitelist(&config.whitelist)?;
    Ok(())
}

/// Validates frontier sizing and local seeds
fn validate_frontier_config(config: &FrontierConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("priority-capacity", config.priority_capacity),
        ("overflow-capacity", config.overflow_capacity),
        ("host-capacity", config.host_capacity),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if !config.local_seeds.is_empty() && !config.local_files {
        return Err(ConfigError::Validation(
            "local-seeds requires local-files = true".to_string(),
        ));
    }

    for seed in &config.local_seeds {
        match parse_link(seed) {
            Ok(LinkTarget::LocalFile { .. }) => {}
            Ok(LinkTarget::Web { .. }) => {
                return Err(ConfigError::Validation(format!(
                    "Local seed '{}' must use the file scheme",
                    seed
                )));
            }
            Err(e) => {
                return Err(ConfigError::InvalidUrl(format!(
                    "Invalid local seed '{}': {}",
                    seed, e
                )));
            }
        }
    }

    Ok(())
}

/// Validates whitelist entries
fn validate_whitelist(entries: &[WhitelistEntry]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for entry in entries {
        validate_host(&entry.host)?;

        if !seen.insert(entry.host.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Host '{}' is whitelisted more than once",
                entry.host
            )));
        }

        for seed in &entry.seeds {
            let target = parse_link(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            match target {
                LinkTarget::Web { host, .. } if host == entry.host => {}
                LinkTarget::Web { host, .. } => {
                    return Err(ConfigError::Validation(format!(
                        "Seed URL '{}' is on host '{}', expected '{}'",
                        seed, host, entry.host
                    )));
                }
                LinkTarget::LocalFile { .. } => {
                    return Err(ConfigError::Validation(format!(
                        "Seed URL '{}' must use HTTPS scheme",
                        seed
                    )));
                }
            }
        }

        for pattern in &entry.exclude {
            Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidPattern(format!(
                    "Exclusion '{}' for '{}' does not compile: {}",
                    pattern, entry.host, e
                ))
            })?;
        }
    }

    Ok(())
}

/// Validates a host name with an optional port
fn validate_host(host: &str) -> ConfigResult<()> {
    let (name, port) = match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    };

    if let Some(port) = port {
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPattern(format!(
                "Host '{}' has an invalid port",
                host
            )));
        }
    }

    if name.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host cannot be empty".to_string(),
        ));
    }

    // Hosts are compared against lowercased URL hosts
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' must be lowercase and contain only letters, digits, '.' and '-'",
            host
        )));
    }

    if name.starts_with('.') || name.ends_with('.') || name.starts_with('-') || name.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if name.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
