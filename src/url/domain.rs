use url::Url;

/// Returns true if both URLs belong to the same site
///
/// The scheme is not part of the site, so `http://` and `https://` on one
/// host match. Ports are only compared when either URL spells one out:
/// `example.com:8080` and `example.com` differ.
///
/// # Examples
///
/// ```
/// use page_harvest::url::same_host;
///
/// assert!(same_host("http://shop.example.com/", "https://SHOP.example.com/page/2/"));
/// assert!(!same_host("https://shop.example.com/", "https://cdn.example.com/"));
/// ```
pub fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => {
            let hosts_match = match (a.host_str(), b.host_str()) {
                (Some(ha), Some(hb)) => ha.eq_ignore_ascii_case(hb),
                _ => false,
            };
            let ports_match = (a.port().is_none() && b.port().is_none())
                || a.port_or_known_default() == b.port_or_known_default();
            hosts_match && ports_match
        }
        _ => false,
    }
}
