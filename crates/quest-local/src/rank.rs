//! Deterministic relevance ordering for findings.
//!
//! Self-contained token-overlap scoring, no embeddings backend and no
//! network. Prompt assembly does not depend on this module; it only shapes
//! which findings the caller surfaces first.

fn tokenize(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for ch in s.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            cur.push(c);
        } else if !cur.is_empty() {
            if cur.len() >= 2 {
                out.push(cur.clone());
            }
            cur.clear();
        }
    }
    if !cur.is_empty() && cur.len() >= 2 {
        out.push(cur);
    }
    out.sort();
    out.dedup();
    out
}

fn overlap_score(query_toks: &[String], text_toks: &[String]) -> f32 {
    if query_toks.is_empty() || text_toks.is_empty() {
        return 0.0;
    }
    let mut i = 0usize;
    let mut j = 0usize;
    let mut inter = 0u32;
    while i < query_toks.len() && j < text_toks.len() {
        match query_toks[i].cmp(&text_toks[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                inter += 1;
                i += 1;
                j += 1;
            }
        }
    }
    inter as f32 / query_toks.len() as f32
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedFinding {
    /// Index into the caller's finding list.
    pub index: usize,
    pub score: f32,
}

/// Rank finding texts against a query: score desc, ties keep stored order.
pub fn rank(query: &str, texts: &[String]) -> Vec<RankedFinding> {
    let query_toks = tokenize(query);
    let mut ranked: Vec<RankedFinding> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| RankedFinding {
            index,
            score: overlap_score(&query_toks, &tokenize(text)),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
    ranked
}

/// Convenience: the top `n` finding texts in ranked order.
pub fn top_findings(query: &str, texts: &[String], n: usize) -> Vec<String> {
    rank(query, texts)
        .into_iter()
        .take(n)
        .map(|r| texts[r.index].clone())
        .collect()
}
