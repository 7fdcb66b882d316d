// src/crawl/summary.rs
// =============================================================================
// What a finished crawl found.
//
// Built by the engine while tasks complete; broken-link referrers are filled
// in from the link graph once the crawl is over, so pages that linked to a
// broken URL after it was first reported still show up.
// =============================================================================

use serde::Serialize;
use url::Url;

/// A link whose target could not be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct BrokenLink {
    pub target: Url,
    /// Pages linking to the target. Empty for the seed.
    pub referrers: Vec<Url>,
    pub cause: String,
}

/// An href that is not a valid URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadLink {
    pub page: Url,
    pub raw: String,
    pub cause: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlSummary {
    /// Tasks that ran to completion (successfully or not)
    pub completed: usize,
    pub broken: Vec<BrokenLink>,
    pub bad_syntax: Vec<BadLink>,
    /// Tasks that panicked or were aborted
    pub errors: usize,
}

impl CrawlSummary {
    pub fn has_broken_links(&self) -> bool {
        !self.broken.is_empty()
    }
}
