// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Two families:
// - FetchError: one URI could not be fetched. Recoverable, it becomes a
//   "broken link" report and the crawl carries on.
// - CrawlError: problems at the engine level. Setup errors abort the crawl,
//   task errors are reported and counted as completed work.
//
// Malformed hrefs are plain url::ParseError values carried next to the raw
// attribute text (see checker::ExtractedLink).
// =============================================================================

use std::path::PathBuf;

/// Why a single page could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("could not resolve hostname: {0}")]
    Dns(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("connection failed: {0}")]
    Connect(String),

    /// Server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Engine-level failures.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The page cache directory could not be created. Fatal.
    #[error("failed to create cache dir {}: {source}", .path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A fetch task panicked. The crawl continues without it.
    #[error("task for {uri} panicked: {message}")]
    TaskPanicked { uri: String, message: String },

    /// A fetch task was cancelled or could not be joined.
    #[error("task failed to complete: {0}")]
    TaskAborted(String),
}
