//! HTML document parsing and pagination discovery
//!
//! This module handles:
//! - Building a queryable document from raw fetched bytes
//! - Collecting the targets of page-number anchors in document order

use scraper::{Html, Selector};
use thiserror::Error;

/// Bytes inspected when deciding whether a body is binary
const SNIFF_LEN: usize = 512;

/// Reasons a fetched body cannot become a queryable document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document body is empty")]
    Empty,

    #[error("document body is binary")]
    Binary,
}

/// Parses raw bytes into an HTML document
///
/// Parsing is lenient: invalid UTF-8 is replaced and broken markup is
/// repaired by html5ever, which also drops stray NUL characters. Only bodies
/// that cannot hold any markup at all are rejected: empty or whitespace-only
/// bodies, and binary payloads (a NUL in the leading bytes and no `<`
/// anywhere).
///
/// # Example
///
/// ```
/// use page_harvest::crawler::parse_document;
///
/// let document = parse_document(b"<ul><li class=product>unclosed").unwrap();
/// assert!(parse_document(b"   \n").is_err());
/// ```
pub fn parse_document(body: &[u8]) -> Result<Html, DocumentError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(DocumentError::Empty);
    }

    if looks_binary(body) {
        return Err(DocumentError::Binary);
    }

    let html = String::from_utf8_lossy(body);
    Ok(Html::parse_document(&html))
}

fn looks_binary(body: &[u8]) -> bool {
    let head = &body[..body.len().min(SNIFF_LEN)];
    head.contains(&0) && !body.contains(&b'<')
}

/// Collects the link targets of every pagination anchor in the document
///
/// Anchors are returned in document order, duplicates included; the frontier
/// is responsible for deduplication. Anchors without `attr` are skipped.
/// Values are returned as written in the markup, unresolved.
pub fn discover_pagination(document: &Html, pagination: &Selector, attr: &str) -> Vec<String> {
    let mut links = Vec::new();

    for element in document.select(pagination) {
        match element.value().attr(attr) {
            Some(href) => links.push(href.to_string()),
            None => {
                tracing::trace!("Pagination anchor without `{}` skipped", attr);
            }
        }
    }

    links
}
