// src/config.rs
// =============================================================================
// Immutable crawl configuration.
//
// Values come from the command line (or LINK_WARDEN_* environment variables,
// see cli.rs) and are fixed once the crawl starts.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default time-to-live for cached pages (5 minutes).
pub const DEFAULT_CACHE_TTL_MS: i64 = 300_000;

/// Cache directory name inside the base directory. Non-static runs append a
/// random suffix.
pub const CACHE_DIR_PREFIX: &str = "link-warden-page-cache";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_USER_AGENT: &str = concat!("link-warden/", env!("CARGO_PKG_VERSION"));

/// Where cached pages live and how long they stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachingConfig {
    ttl_ms: i64,
    dir: PathBuf,
}

impl CachingConfig {
    /// A TTL of zero or less disables caching: every entry is stale.
    pub fn new(ttl_ms: i64, dir: impl Into<PathBuf>) -> Self {
        Self {
            ttl_ms,
            dir: dir.into(),
        }
    }

    /// Static mode: a fixed directory shared by every run, and unless a TTL
    /// was given explicitly, entries never expire.
    pub fn fixed(base: &Path, ttl_ms: Option<i64>) -> Self {
        Self::new(ttl_ms.unwrap_or(i64::MAX), base.join(CACHE_DIR_PREFIX))
    }

    /// A fresh, randomly named directory for this run only.
    pub fn per_run(base: &Path, ttl_ms: Option<i64>) -> Self {
        let name = format!("{CACHE_DIR_PREFIX}{}", uuid::Uuid::new_v4());
        Self::new(ttl_ms.unwrap_or(DEFAULT_CACHE_TTL_MS), base.join(name))
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// None when caching is disabled.
    pub fn ttl(&self) -> Option<Duration> {
        u64::try_from(self.ttl_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Everything the engine needs to run one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Where the crawl starts; its host defines "on-site"
    pub seed: Url,
    pub caching: CachingConfig,
    /// Links to these hosts are never scheduled
    pub excluded_hosts: HashSet<String>,
    /// Maximum number of pages fetched at the same time
    pub workers: usize,
    /// Per-request timeout (connect and total)
    pub timeout: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn new(seed: Url, caching: CachingConfig) -> Self {
        Self {
            seed,
            caching,
            excluded_hosts: HashSet::new(),
            workers: default_workers(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_excluded_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_hosts = hosts
            .into_iter()
            .map(|host| host.as_ref().trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Two workers per available core.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}
