use serde::Deserialize;

/// Default size of the priority ring queue
pub const DEFAULT_PRIORITY_CAPACITY: usize = 100;

/// Default size of the overflow stack
pub const DEFAULT_OVERFLOW_CAPACITY: usize = 1_000_000;

/// Default number of hosts the filter can intern
pub const DEFAULT_HOST_CAPACITY: usize = 10_000;

/// Main configuration structure for Sumi-Frontier
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub frontier: FrontierConfig,

    #[serde(default)]
    pub whitelist: Vec<WhitelistEntry>,
}

/// Frontier sizing and crawl mode
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Capacity of the priority ring queue
    #[serde(rename = "priority-capacity")]
    pub priority_capacity: usize,

    /// Capacity of the overflow stack
    #[serde(rename = "overflow-capacity")]
    pub overflow_capacity: usize,

    /// Maximum number of whitelisted hosts
    #[serde(rename = "host-capacity")]
    pub host_capacity: usize,

    /// Accept `file://` links through the URL entry points
    #[serde(rename = "local-files")]
    pub local_files: bool,

    /// `file://` URLs seeded at startup, requires `local-files`
    #[serde(rename = "local-seeds")]
    pub local_seeds: Vec<String>,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            priority_capacity: DEFAULT_PRIORITY_CAPACITY,
            overflow_capacity: DEFAULT_OVERFLOW_CAPACITY,
            host_capacity: DEFAULT_HOST_CAPACITY,
            local_files: false,
            local_seeds: Vec::new(),
        }
    }
}

/// A whitelisted host with its seed URLs and excluded paths
#[derive(Debug, Clone, Deserialize)]
pub struct WhitelistEntry {
    /// Host name, optionally with a port (e.g., "en.wikipedia.org")
    pub host: String,

    /// Absolute `https://` URLs on this host fed in at startup
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Regular expressions matched against the inner path of each link
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Config {
    /// Total number of configured seed URLs
    pub fn seed_count(&self) -> usize {
        self.frontier.local_seeds.len()
            + self.whitelist.iter().map(|w| w.seeds.len()).sum::<usize>()
    }
}
