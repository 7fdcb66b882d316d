// src/crawl/task.rs
// =============================================================================
// One page visit.
//
// How it works:
// 1. Report "crawling" with the current progress counters
// 2. Fetch the page (through the cache)
// 3. Off-site pages stop here: we only wanted to know they resolve
// 4. Extract links, resolved against the page's own URL
// 5. Skip malformed (reported) and non-crawlable links
// 6. Record the edge, then try to claim the link in the visited set
//
// Claimed links go back to the engine, which spawns a task for each. A link
// some other task claimed first still gets its edge recorded.
// =============================================================================

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::checker::{extract_html_links, ExtractedLink};
use crate::crawl::cache::PageCache;
use crate::crawl::graph::LinkGraph;
use crate::crawl::summary::BadLink;
use crate::error::FetchError;
use crate::report::ReportSink;

/// Submitted and completed task counts, shared with workers for progress.
#[derive(Debug, Default)]
pub struct Progress {
    total: AtomicUsize,
    completed: AtomicUsize,
}

impl Progress {
    pub fn submitted(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// (completed, total)
    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.completed.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }
}

/// State shared by every task of one crawl.
pub struct CrawlContext {
    pub home: Url,
    pub cache: PageCache,
    pub graph: LinkGraph,
    pub reporter: Arc<dyn ReportSink>,
    pub excluded_hosts: HashSet<String>,
    pub progress: Progress,
}

impl CrawlContext {
    /// Same host as the seed. Only on-site pages are parsed for links.
    pub fn is_on_site(&self, url: &Url) -> bool {
        url.host_str() == self.home.host_str()
    }

    // A link worth scheduling:
    // - no fragment (a#x is excluded, not normalized to a)
    // - http or https with a host
    // - host not excluded
    pub fn is_crawlable(&self, url: &Url) -> bool {
        if url.fragment().is_some() {
            return false;
        }
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        match url.host_str() {
            Some(host) => !self.excluded_hosts.contains(host),
            None => false,
        }
    }
}

/// How a visit ended.
#[derive(Debug)]
pub enum VisitOutcome {
    /// On-site page parsed. `discovered` holds links this task claimed.
    Crawled {
        discovered: Vec<Url>,
        bad_links: Vec<BadLink>,
    },
    /// Off-site page fetched fine, not parsed
    OffSite,
    /// Fetch failed; already reported as a broken link
    Broken { cause: FetchError },
}

#[derive(Debug, Clone)]
pub struct FetchTask {
    pub uri: Url,
    /// Page the URI was found on; None for the seed
    pub referrer: Option<Url>,
}

impl FetchTask {
    pub fn new(uri: Url, referrer: Option<Url>) -> Self {
        Self { uri, referrer }
    }

    pub async fn run(&self, ctx: &CrawlContext) -> VisitOutcome {
        let (completed, total) = ctx.progress.snapshot();
        ctx.reporter.crawling(&self.uri, completed, total);

        let page = match ctx.cache.fetch_page(&self.uri).await {
            Ok(page) => page,
            Err(cause) => {
                ctx.reporter
                    .broken_link(self.referrer.as_ref(), &self.uri, &cause);
                return VisitOutcome::Broken { cause };
            }
        };

        if !ctx.is_on_site(&self.uri) {
            return VisitOutcome::OffSite;
        }

        let mut discovered = Vec::new();
        let mut bad_links = Vec::new();

        for link in extract_html_links(&page, &self.uri) {
            let link = match link {
                ExtractedLink::Resolved(url) => url,
                ExtractedLink::Malformed { raw, error } => {
                    ctx.reporter.bad_link_syntax(&self.uri, &raw, &error);
                    bad_links.push(BadLink {
                        page: self.uri.clone(),
                        raw,
                        cause: error.to_string(),
                    });
                    continue;
                }
            };

            if !ctx.is_crawlable(&link) {
                continue;
            }

            ctx.graph.record_edge(&link, &self.uri);
            if ctx.graph.try_visit(&link) {
                discovered.push(link);
            }
        }

        VisitOutcome::Crawled {
            discovered,
            bad_links,
        }
    }
}
