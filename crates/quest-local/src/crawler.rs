//! Depth-limited crawl: one search request, then candidate pages in result
//! order until enough pages have contributed snippets.

use crate::{extract, links};
use quest_core::{
    Error, FetchBackend, FetchRequest, Result, SearchProvider, SnippetRecord, SnippetStore,
};
use tracing::{debug, info, warn};
use url::Url;

/// Upper bound on result links mined from one search page.
pub const MAX_CANDIDATES: usize = 100;
/// Per-page fetch timeout; a hung page must not hang the crawl.
pub const FETCH_TIMEOUT_MS: u64 = 15_000;
/// Per-page body cap.
pub const MAX_PAGE_BYTES: u64 = 2_000_000;

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub query: String,
    pub records: Vec<SnippetRecord>,
    /// Distinct pages that contributed at least one record.
    pub pages_contributing: usize,
    /// Candidates actually fetched (skip-list hits excluded).
    pub pages_attempted: usize,
    pub candidates: usize,
}

/// Crawl `query` until `target_pages` distinct pages have contributed
/// records or the candidate list runs out.
///
/// The search request is the only fatal step. A query already present in the
/// store short-circuits with [`Error::DuplicateQuery`] before any network
/// call; per-page fetch or extraction failures are skipped.
pub async fn crawl(
    search: &dyn SearchProvider,
    fetcher: &dyn FetchBackend,
    store: &SnippetStore,
    query: &str,
    target_pages: usize,
) -> Result<CrawlOutcome> {
    if store.has_query(query) {
        return Err(Error::DuplicateQuery(query.to_string()));
    }

    let html = search.search(query).await?;
    let candidates = links::extract_result_links(&html, MAX_CANDIDATES);
    debug!(
        query,
        candidates = candidates.len(),
        provider = search.name(),
        "search page mined for result links"
    );

    let skip_list = store.links_already_seen();
    let mut records: Vec<SnippetRecord> = Vec::new();
    let mut pages_contributing = 0usize;
    let mut pages_attempted = 0usize;

    // Explicit bound on the candidate index; progress is counted only for
    // pages that actually contributed records.
    for link in &candidates {
        if pages_contributing >= target_pages {
            break;
        }
        if skip_list.contains(link) {
            debug!(%link, "already visited in a prior crawl, skipping");
            continue;
        }

        pages_attempted += 1;
        match fetch_page_records(fetcher, link, query).await {
            Ok(page_records) if !page_records.is_empty() => {
                debug!(%link, snippets = page_records.len(), "page contributed");
                records.extend(page_records);
                pages_contributing += 1;
            }
            Ok(_) => {
                debug!(%link, "page had no useful text, skipping");
            }
            Err(e) => {
                warn!(%link, error = %e, "page fetch failed, skipping");
            }
        }
    }

    info!(
        query,
        pages_contributing,
        snippets = records.len(),
        "crawl finished"
    );

    Ok(CrawlOutcome {
        query: query.to_string(),
        records,
        pages_contributing,
        pages_attempted,
        candidates: candidates.len(),
    })
}

async fn fetch_page_records(
    fetcher: &dyn FetchBackend,
    link: &Url,
    query: &str,
) -> Result<Vec<SnippetRecord>> {
    let resp = fetcher
        .fetch(&FetchRequest {
            url: link.to_string(),
            timeout_ms: Some(FETCH_TIMEOUT_MS),
            max_bytes: Some(MAX_PAGE_BYTES),
        })
        .await?;
    if !resp.is_success() {
        return Err(Error::Fetch(format!("page HTTP {}", resp.status)));
    }

    Ok(extract::page_fragments(&resp.text_lossy())
        .into_iter()
        .map(|text| SnippetRecord {
            text,
            link: link.clone(),
            query: query.to_string(),
        })
        .collect())
}
