//! Frontier module: deduplication and the two-tier work queue
//!
//! This module contains:
//! - The host whitelist and global dedup filter
//! - URL compaction against the interned host table
//! - The frontier orchestrator with its input and output threads

mod filter;
mod link_handler;

pub use filter::{Filter, UrlCompact};
pub use link_handler::{Admission, Frontier};
