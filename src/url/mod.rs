//! URL handling module for Page-Harvest
//!
//! Pagination hrefs are resolved against the page they were found on and
//! normalized by the configured link policy. After that, URL identity in the
//! frontier is plain string equality.

mod domain;
mod normalize;

pub use domain::same_host;
pub use normalize::{normalize_url, resolve_link};
