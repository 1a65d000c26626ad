use serde::Deserialize;

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub selectors: SelectorConfig,
    pub links: LinkConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Absolute URL of the first listing page
    pub seed: Option<String>,

    /// Maximum number of pages visited
    pub max_pages: u32,

    /// Total time allowed for one fetch (milliseconds)
    pub request_timeout_ms: u64,

    /// Time allowed to establish a connection (milliseconds)
    pub connect_timeout_ms: u64,

    /// Pause between two page visits (milliseconds)
    pub page_delay_ms: u64,

    /// Only follow pagination links that stay on the seed's host
    pub same_host_only: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_pages: 5,
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            page_delay_ms: 0,
            same_host_only: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "page-harvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// A structural query for one record field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldSelector {
    /// CSS selector evaluated under the item node
    pub selector: String,

    /// Attribute to read; element text when absent
    #[serde(default)]
    pub attr: Option<String>,
}

impl FieldSelector {
    fn new(selector: &str, attr: Option<&str>) -> Self {
        Self {
            selector: selector.to_string(),
            attr: attr.map(str::to_string),
        }
    }
}

/// Selectors describing the listing markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Selector matching one node per listing item
    pub item: String,

    pub link: FieldSelector,
    pub image: FieldSelector,
    pub name: FieldSelector,
    pub price: FieldSelector,

    /// Selector matching page-number anchors, evaluated on the whole document
    pub pagination: String,

    /// Attribute holding the pagination target
    pub pagination_attr: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: "li.product".to_string(),
            link: FieldSelector::new("a", Some("href")),
            image: FieldSelector::new("img", Some("src")),
            name: FieldSelector::new("h2", None),
            price: FieldSelector::new("span", None),
            pagination: "a.page-numbers".to_string(),
            pagination_attr: "href".to_string(),
        }
    }
}

/// Link normalization policy
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LinkConfig {
    /// Drop `#fragment` parts before comparing URLs
    pub strip_fragment: bool,

    /// Drop a trailing `/` from non-root paths before comparing URLs
    pub strip_trailing_slash: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            strip_fragment: true,
            strip_trailing_slash: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the CSV file rewritten after every page
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "products.csv".to_string(),
        }
    }
}
