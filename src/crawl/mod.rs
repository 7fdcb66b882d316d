// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Concurrent crawling from a seed URL with a bounded worker pool
// - Every URL is fetched at most once (visited set)
// - Only pages on the seed's host are parsed for more links; off-site links
//   are fetched once to check that they resolve
// - Fetched pages are cached on disk with a time-to-live
//
// Pieces:
// - cache: disk-backed page cache
// - graph: visited set + "who links here" map
// - task: one page visit
// - engine: the scheduling loop
// - summary: what the crawl found
// =============================================================================

mod cache;
mod engine;
mod graph;
pub mod summary;
mod task;

#[cfg(test)]
mod testing;

pub use engine::CrawlEngine;
pub use summary::CrawlSummary;
