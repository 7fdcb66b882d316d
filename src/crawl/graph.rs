// src/crawl/graph.rs
// =============================================================================
// Who links to whom, and which URLs have already been scheduled.
//
// Two independent concurrent structures:
// - visited: every URL ever claimed for fetching. `try_visit` is the only
//   gate into the worker pool, so a URL is fetched at most once per crawl.
// - to_from: target URL -> the pages that link to it. Only grows.
//
// Both are DashMap/DashSet (sharded locks), so workers touching unrelated
// URLs rarely contend, and neither shares a lock with the engine's task
// bookkeeping.
// =============================================================================

use dashmap::{DashMap, DashSet};
use std::collections::HashSet;
use url::Url;

#[derive(Debug, Default)]
pub struct LinkGraph {
    visited: DashSet<Url>,
    to_from: DashMap<Url, HashSet<Url>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for fetching.
    ///
    /// Returns true for exactly one caller per URL over the whole crawl; every
    /// later (or concurrent) call gets false.
    pub fn try_visit(&self, url: &Url) -> bool {
        // DashSet::insert checks and inserts under the shard's write lock
        self.visited.insert(url.clone())
    }

    /// Remember that `source` links to `target`. Repeats are no-ops.
    pub fn record_edge(&self, target: &Url, source: &Url) {
        self.to_from
            .entry(target.clone())
            .or_default()
            .insert(source.clone());
    }

    /// Pages linking to `target`, sorted.
    pub fn referrers(&self, target: &Url) -> Vec<Url> {
        let mut referrers: Vec<Url> = self
            .to_from
            .get(target)
            .map(|sources| sources.iter().cloned().collect())
            .unwrap_or_default();
        referrers.sort();
        referrers
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of distinct (target, source) pairs.
    pub fn edge_count(&self) -> usize {
        self.to_from.iter().map(|entry| entry.value().len()).sum()
    }
}
