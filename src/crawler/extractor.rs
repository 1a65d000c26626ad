//! Record extraction from listing item nodes
//!
//! Each item node yields one [`Record`] built from four sub-element queries.
//! The first match under the item is used for each field; a field with no
//! match produces [`ExtractError::MissingField`] and the item is skipped.
//! Values are copied verbatim: no trimming, decoding or whitespace folding.

use crate::config::{FieldSelector, SelectorConfig};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One extracted listing entry
///
/// Field order matches the CSV header `url,image,name,price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub url: String,
    pub image: String,
    pub name: String,
    pub price: String,
}

/// The four fields of a [`Record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Url,
    Image,
    Name,
    Price,
}

impl RecordField {
    /// Returns the column name of this field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Image => "image",
            Self::Name => "name",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extraction failure for a single item
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("item has no {field} element")]
    MissingField { field: RecordField },

    #[error("item's {field} element has no `{attr}` attribute")]
    MissingAttribute { field: RecordField, attr: String },
}

/// A compiled field query: selector plus optional attribute
#[derive(Debug, Clone)]
struct FieldQuery {
    field: RecordField,
    selector: Selector,
    attr: Option<String>,
}

impl FieldQuery {
    fn compile(field: RecordField, config: &FieldSelector) -> Result<Self, ConfigError> {
        Ok(Self {
            field,
            selector: compile_selector(&config.selector)?,
            attr: config.attr.clone(),
        })
    }

    fn extract(&self, item: ElementRef<'_>) -> Result<String, ExtractError> {
        let element = item
            .select(&self.selector)
            .next()
            .ok_or(ExtractError::MissingField { field: self.field })?;

        match &self.attr {
            Some(attr) => element
                .value()
                .attr(attr)
                .map(str::to_string)
                .ok_or_else(|| ExtractError::MissingAttribute {
                    field: self.field,
                    attr: attr.clone(),
                }),
            None => Ok(element.text().collect()),
        }
    }
}

/// Compiled selectors for one listing layout
#[derive(Debug, Clone)]
pub struct Selectors {
    item: Selector,
    url: FieldQuery,
    image: FieldQuery,
    name: FieldQuery,
    price: FieldQuery,
    pagination: Selector,
    pagination_attr: String,
}

impl Selectors {
    /// Compiles every selector in the configuration
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile_selector(&config.item)?,
            url: FieldQuery::compile(RecordField::Url, &config.link)?,
            image: FieldQuery::compile(RecordField::Image, &config.image)?,
            name: FieldQuery::compile(RecordField::Name, &config.name)?,
            price: FieldQuery::compile(RecordField::Price, &config.price)?,
            pagination: compile_selector(&config.pagination)?,
            pagination_attr: config.pagination_attr.clone(),
        })
    }

    /// Returns the item nodes of a document in document order
    pub fn items<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.item).collect()
    }

    /// Selector for pagination anchors
    pub fn pagination(&self) -> &Selector {
        &self.pagination
    }

    /// Attribute holding the pagination target
    pub fn pagination_attr(&self) -> &str {
        &self.pagination_attr
    }
}

/// Extracts one record from an item node
///
/// # Example
///
/// ```
/// use page_harvest::config::SelectorConfig;
/// use page_harvest::crawler::{extract_record, parse_document, Selectors};
///
/// let selectors = Selectors::compile(&SelectorConfig::default()).unwrap();
/// let document = parse_document(
///     br#"<li class="product"><a href="/p/1"><img src="/1.jpg"><h2>Hat</h2><span>$5</span></a></li>"#,
/// ).unwrap();
/// let items = selectors.items(&document);
/// let record = extract_record(items[0], &selectors).unwrap();
/// assert_eq!(record.name, "Hat");
/// ```
pub fn extract_record(item: ElementRef<'_>, selectors: &Selectors) -> Result<Record, ExtractError> {
    Ok(Record {
        url: selectors.url.extract(item)?,
        image: selectors.image.extract(item)?,
        name: selectors.name.extract(item)?,
        price: selectors.price.extract(item)?,
    })
}

fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
