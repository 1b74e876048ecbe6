//! URL handling for the frontier
//!
//! This module turns links coming from the fetch engine into the
//! `(host, inner path)` pairs the frontier deduplicates on, and provides the
//! normalization applied before splitting.

mod link;
mod normalize;

pub use link::{extract_host, parse_link, resolve_link, split_url, LinkTarget, FILE_HOST};
pub use normalize::normalize_url;
