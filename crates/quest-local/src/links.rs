//! Result-link extraction from a search result page.
//!
//! Result anchors carry an internal redirect (`/url?q=<target>&sa=U&ved=...`);
//! we strip the redirect wrapper and the tracking suffix, drop
//! authentication/support-domain links, and dedup while preserving
//! first-seen order.

use std::collections::BTreeSet;
use url::Url;

const RESULT_MARKER: &str = "/url?q=";
const TRACKING_SUFFIX: &str = "&sa=U&ved=";
const EXCLUDED_HOSTS: &[&str] = &["accounts.google.com", "support.google.com"];

/// Extract candidate result links from a search page, in document order.
pub fn extract_result_links(html: &str, max_links: usize) -> Vec<Url> {
    let max_links = max_links.min(500);
    if max_links == 0 {
        return Vec::new();
    }

    let doc = html_scraper::Html::parse_document(html);
    let sel = match html_scraper::Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = BTreeSet::<String>::new();
    let mut out: Vec<Url> = Vec::new();
    for el in doc.select(&sel) {
        if out.len() >= max_links {
            break;
        }
        let href = match el.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if !href.contains(RESULT_MARKER) {
            continue;
        }
        if EXCLUDED_HOSTS.iter().any(|host| href.contains(host)) {
            continue;
        }

        let target = href
            .split(TRACKING_SUFFIX)
            .next()
            .unwrap_or(href)
            .replace(RESULT_MARKER, "");
        let Ok(mut u) = Url::parse(&target) else {
            continue;
        };
        // Drop fragments for stability.
        u.set_fragment(None);

        if !seen.insert(u.to_string()) {
            continue;
        }
        out.push(u);
    }

    out
}
