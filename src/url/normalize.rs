use crate::config::LinkConfig;
use crate::{UrlError, UrlResult};
use url::Url;

/// Href prefixes that never point at another listing page
const IGNORED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes an absolute URL according to the link policy
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Reject schemes other than HTTP and HTTPS
/// 3. Remove the fragment (when `strip_fragment` is set)
/// 4. Remove a trailing slash from non-root paths (when `strip_trailing_slash` is set)
///
/// Host case is folded by the URL parser itself. Nothing else is rewritten:
/// after this step two URLs identify the same page only if their strings are equal.
///
/// # Examples
///
/// ```
/// use page_harvest::config::LinkConfig;
/// use page_harvest::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/shop/page/2/#top", &LinkConfig::default()).unwrap();
/// assert_eq!(url, "https://example.com/shop/page/2/");
/// ```
pub fn normalize_url(url_str: &str, policy: &LinkConfig) -> UrlResult<String> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url, policy)
}

/// Resolves an href found on `base` into a normalized absolute URL
///
/// Site-relative and path-relative hrefs are joined onto the page they were
/// found on. Script, mail, phone, data and fragment-only hrefs are rejected
/// with [`UrlError::Ignored`].
pub fn resolve_link(href: &str, base: &Url, policy: &LinkConfig) -> UrlResult<String> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Ignored("empty href".to_string()));
    }

    if href.starts_with('#') {
        return Err(UrlError::Ignored(format!("fragment-only href {}", href)));
    }

    let lowered = href.to_ascii_lowercase();
    if IGNORED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return Err(UrlError::Ignored(format!("non-page href {}", href)));
    }

    let url = base.join(href).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url, policy)
}

fn normalize_parsed(mut url: Url, policy: &LinkConfig) -> UrlResult<String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    if policy.strip_fragment {
        url.set_fragment(None);
    }

    if policy.strip_trailing_slash {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            let trimmed = if trimmed.is_empty() { "/".to_string() } else { trimmed };
            url.set_path(&trimmed);
        }
    }

    Ok(url.to_string())
}
