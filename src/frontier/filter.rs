//! Host whitelist and global URL deduplication
//!
//! The filter is the only gate a URL passes before entering either tier of the
//! frontier. A URL is admitted at most once per session: the first successful
//! [`Filter::compact`] marks its `(host, inner path)` pair as visited.

use crate::state::HostState;
use crate::sync::{SlotAllocator, SlotIndex};
use crate::url::FILE_HOST;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A queued URL that references its host through the host table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCompact {
    is_web: bool,
    host: SlotIndex,
    inner_path: String,
}

impl UrlCompact {
    pub fn is_web(&self) -> bool {
        self.is_web
    }

    pub fn host(&self) -> SlotIndex {
        self.host
    }

    pub fn inner_path(&self) -> &str {
        &self.inner_path
    }
}

/// Whitelist of hosts plus the visited set of each host
#[derive(Debug)]
pub struct Filter {
    /// Interned host names, addressed by the handles stored in `UrlCompact`
    hosts: SlotAllocator<String>,

    states: Mutex<HashMap<String, HostState>>,
}

impl Filter {
    /// Creates an empty filter able to intern up to `host_capacity` hosts
    pub fn new(host_capacity: usize) -> Self {
        Self {
            hosts: SlotAllocator::new(host_capacity),
            states: Mutex::new(HashMap::new()),
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, HostState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allows URLs of `host` into the frontier
    ///
    /// Whitelisting a host twice keeps its visited set. Returns false only
    /// when the host table is full.
    pub fn whitelist(&self, host: &str, is_web: bool) -> bool {
        if self.states().contains_key(host) {
            return true;
        }

        let Some(handle) = self.hosts.try_push(host.to_string()) else {
            tracing::debug!("Host table full, cannot whitelist {}", host);
            return false;
        };

        let mut states = self.states();
        if states.contains_key(host) {
            // Lost a race with another whitelist of the same host.
            drop(states);
            self.hosts.pop(handle);
            return true;
        }
        states.insert(host.to_string(), HostState::new(is_web, handle));
        tracing::debug!("Whitelisted host {} as {}", host, handle);
        true
    }

    /// Rejects inner paths of `host` that match `pattern`
    ///
    /// Returns false if the host is not whitelisted.
    pub fn exclude(&self, host: &str, pattern: &Regex) -> bool {
        let mut states = self.states();
        let Some(state) = states.get_mut(host) else {
            tracing::debug!("Cannot add exclusion for {}: host not whitelisted", host);
            return false;
        };
        match state.add_exclusion(pattern) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to combine exclusion patterns for {}: {}", host, e);
                false
            }
        }
    }

    /// Admits `(host, inner_path)` once and returns its compact form
    ///
    /// Returns `None` when the host is not whitelisted, the path is excluded
    /// or the pair was admitted before.
    pub fn compact(&self, host: &str, inner_path: &str) -> Option<UrlCompact> {
        let mut states = self.states();
        let Some(state) = states.get_mut(host) else {
            tracing::debug!("Host {} not whitelisted", host);
            return None;
        };

        if state.is_excluded(inner_path) {
            tracing::debug!("Path {}{} excluded", host, inner_path);
            return None;
        }

        if !state.mark_visited(inner_path) {
            tracing::debug!("URL {}{} already visited", host, inner_path);
            return None;
        }

        Some(UrlCompact {
            is_web: state.is_web,
            host: state.handle,
            inner_path: inner_path.to_string(),
        })
    }

    /// Rebuilds the full URL string of a compact URL
    ///
    /// Returns `None` if the host handle is no longer in the host table.
    pub fn expand(&self, url: &UrlCompact) -> Option<String> {
        if !url.is_web {
            return Some(format!("{}{}", FILE_HOST, url.inner_path));
        }
        let host = self.hosts.peek(url.host)?;
        Some(format!("https://{}{}", host, url.inner_path))
    }

    pub fn is_whitelisted(&self, host: &str) -> bool {
        self.states().contains_key(host)
    }

    /// Number of paths admitted for `host`
    pub fn visited_count(&self, host: &str) -> usize {
        self.states()
            .get(host)
            .map_or(0, |state| state.visited.len())
    }

    /// Number of whitelisted hosts
    pub fn host_count(&self) -> usize {
        self.states().len()
    }
}
