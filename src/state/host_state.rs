use crate::sync::SlotIndex;
use regex::Regex;
use std::collections::HashSet;

/// Tracks one whitelisted host during a crawl session
///
/// Holds the host's interned handle, the inner paths already admitted to the
/// frontier and an optional exclusion pattern for paths that are never worth
/// fetching.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Whether the host is served over `https://` (as opposed to `file://`)
    pub is_web: bool,

    /// Handle of the host name in the filter's host table
    pub handle: SlotIndex,

    /// Inner paths already admitted
    pub visited: HashSet<String>,

    /// Paths matching this pattern are rejected
    pub exclude: Option<Regex>,
}

impl HostState {
    pub fn new(is_web: bool, handle: SlotIndex) -> Self {
        Self {
            is_web,
            handle,
            visited: HashSet::new(),
            exclude: None,
        }
    }

    /// Returns true if `inner_path` matches the exclusion pattern
    pub fn is_excluded(&self, inner_path: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(inner_path))
    }

    /// Marks `inner_path` as visited
    ///
    /// Returns false if it was already visited.
    pub fn mark_visited(&mut self, inner_path: &str) -> bool {
        // Checked first so a repeat does not allocate.
        if self.has_visited(inner_path) {
            return false;
        }
        self.visited.insert(inner_path.to_string())
    }

    pub fn has_visited(&self, inner_path: &str) -> bool {
        self.visited.contains(inner_path)
    }

    /// Combines `pattern` with any existing exclusion pattern
    pub fn add_exclusion(&mut self, pattern: &Regex) -> Result<(), regex::Error> {
        let combined = match &self.exclude {
            Some(existing) => Regex::new(&format!(
                "(?:{})|(?:{})",
                existing.as_str(),
                pattern.as_str()
            ))?,
            None => pattern.clone(),
        };
        self.exclude = Some(combined);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SlotAllocator;

    fn handle() -> SlotIndex {
        SlotAllocator::new(1).push(())
    }

    #[test]
    fn test_new_host_state() {
        let state = HostState::new(true, handle());
        assert!(state.is_web);
        assert!(state.visited.is_empty());
        assert!(state.exclude.is_none());
    }

    #[test]
    fn test_mark_visited_once() {
        let mut state = HostState::new(true, handle());
        assert!(!state.has_visited("/a"));
        assert!(state.mark_visited("/a"));
        assert!(state.has_visited("/a"));
        assert!(!state.mark_visited("/a"));
        assert_eq!(state.visited.len(), 1);
    }

    #[test]
    fn test_no_exclusion_by_default() {
        let state = HostState::new(true, handle());
        assert!(!state.is_excluded("/wiki/Special:Random"));
    }

    #[test]
    fn test_exclusion_pattern() {
        let mut state = HostState::new(true, handle());
        state
            .add_exclusion(&Regex::new("/wiki/(File|Special|User)").unwrap())
            .unwrap();

        assert!(state.is_excluded("/wiki/Special:Random"));
        assert!(state.is_excluded("/wiki/User:Someone"));
        assert!(!state.is_excluded("/wiki/Rust_(programming_language)"));
    }

    #[test]
    fn test_exclusions_combine() {
        let mut state = HostState::new(true, handle());
        state.add_exclusion(&Regex::new("^/static/").unwrap()).unwrap();
        state.add_exclusion(&Regex::new("^/w/").unwrap()).unwrap();

        assert!(state.is_excluded("/static/logo.png"));
        assert!(state.is_excluded("/w/index.php"));
        assert!(!state.is_excluded("/wiki/Main_Page"));
    }
}
