// src/report.rs
// =============================================================================
// Crawl events and the console reporter.
//
// The engine and its tasks call a ReportSink at fixed points:
//   started -> crawling* / broken_link* / bad_link_syntax* / error* -> finished
//
// Calls happen from worker tasks, concurrently, so implementations must be
// Send + Sync and must return quickly (no network, no waiting on locks held
// across IO).
// =============================================================================

use std::io::{IsTerminal, Write};
use std::sync::OnceLock;
use std::time::Instant;
use url::Url;

use crate::error::{CrawlError, FetchError};

/// Receives lifecycle and error events from a crawl.
pub trait ReportSink: Send + Sync {
    fn started(&self);

    fn finished(&self);

    /// A task is about to fetch `uri`.
    fn crawling(&self, uri: &Url, completed: usize, total: usize);

    /// `target` could not be fetched. `page` is None for the seed.
    fn broken_link(&self, page: Option<&Url>, target: &Url, cause: &FetchError);

    /// An href on `page` is not a valid URL.
    fn bad_link_syntax(&self, page: &Url, raw_target: &str, cause: &url::ParseError);

    fn error(&self, error: &CrawlError);
}

// Prints progress and problems to stderr
//
// stdout is left alone so the final summary (possibly JSON) can be piped.
pub struct ConsoleReporter {
    started_at: OnceLock<Instant>,
    progress: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        // The \r progress line only makes sense on a terminal
        Self::with_progress(std::io::stderr().is_terminal())
    }

    pub fn with_progress(progress: bool) -> Self {
        Self {
            started_at: OnceLock::new(),
            progress,
        }
    }

    // None when progress is off
    fn progress_line(&self, uri: &Url, completed: usize, total: usize) -> Option<String> {
        self.progress
            .then(|| format!("\r[{completed:>4}/{total:>4}] {uri}"))
    }
}

fn broken_link_line(page: Option<&Url>, target: &Url, cause: &FetchError) -> String {
    match page {
        Some(page) => format!("\rbad link on {page} to {target}: {cause}"),
        None => format!("\rfailed to fetch {target}: {cause}"),
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for ConsoleReporter {
    fn started(&self) {
        let _ = self.started_at.set(Instant::now());
    }

    fn finished(&self) {
        let elapsed = self
            .started_at
            .get()
            .map(|start| start.elapsed().as_millis())
            .unwrap_or_default();
        if self.progress {
            eprintln!();
        }
        eprintln!("finished, took {elapsed} ms");
    }

    fn crawling(&self, uri: &Url, completed: usize, total: usize) {
        if let Some(line) = self.progress_line(uri, completed, total) {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "{line}");
            let _ = stderr.flush();
        }
    }

    fn broken_link(&self, page: Option<&Url>, target: &Url, cause: &FetchError) {
        eprintln!("{}", broken_link_line(page, target, cause));
    }

    fn bad_link_syntax(&self, page: &Url, raw_target: &str, cause: &url::ParseError) {
        eprintln!("\rbad link syntax on {page} to {raw_target:?}: {cause}");
    }

    fn error(&self, error: &CrawlError) {
        eprintln!("\rerror: {error}");
    }
}
