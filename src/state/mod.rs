//! State module for tracking hosts during a crawl session
//!
//! # Components
//!
//! - `HostState`: per-host visited set, interned handle and path exclusions

mod host_state;

pub use host_state::HostState;
