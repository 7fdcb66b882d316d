// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The minimal invocation is a single URL:
//
//   link-warden https://example.com/
//
// Everything else is optional. Each flag can also come from a LINK_WARDEN_*
// environment variable (clap's `env` feature), handy in CI where the command
// line is fixed but the cache location is not.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::{CachingConfig, CrawlConfig, DEFAULT_CACHE_TTL_MS, DEFAULT_TIMEOUT_SECS};

#[derive(Parser, Debug)]
#[command(
    name = "link-warden",
    version,
    about = "Crawl a website and report broken and malformed links",
    long_about = "link-warden crawls every page reachable from a starting URL on the same host, \
                  checks that each linked page (on-site or off-site) can be fetched, and reports \
                  broken links and malformed hrefs. Fetched pages are cached on disk."
)]
pub struct Cli {
    /// Page to start crawling from (absolute http or https URL)
    ///
    /// Pages on the same host are crawled; other hosts are only checked.
    #[arg(value_name = "URL", value_parser = parse_seed)]
    pub url: Url,

    /// How long cached pages stay fresh, in milliseconds (0 or less disables caching)
    ///
    /// Defaults to 300000, or never expiring with --static-cache.
    #[arg(long, env = "LINK_WARDEN_CACHE_TTL_MS", value_name = "MS", allow_negative_numbers = true)]
    pub cache_ttl_ms: Option<i64>,

    /// Reuse one fixed cache directory across runs instead of a fresh one per run
    #[arg(long, env = "LINK_WARDEN_STATIC_CACHE")]
    pub static_cache: bool,

    /// Directory the cache directory is created in (default: system temp dir)
    #[arg(long, env = "LINK_WARDEN_CACHE_BASE", value_name = "DIR")]
    pub cache_base: Option<PathBuf>,

    /// Exact cache directory to use, overriding --cache-base and --static-cache naming
    #[arg(long, env = "LINK_WARDEN_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Never crawl links to this host (repeatable, or comma-separated)
    #[arg(
        long = "exclude-host",
        env = "LINK_WARDEN_EXCLUDE_HOSTS",
        value_name = "HOST",
        value_delimiter = ','
    )]
    pub exclude_hosts: Vec<String>,

    /// Pages fetched concurrently (default: 2 x available cores)
    #[arg(long, env = "LINK_WARDEN_WORKERS", value_name = "N")]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds (at least 1)
    #[arg(
        long,
        env = "LINK_WARDEN_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 when any broken link was found
    #[arg(long)]
    pub fail_on_broken: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    // Resolves where the cache lives and its TTL
    //
    // Precedence: --cache-dir, then --static-cache (fixed name), then a
    // random per-run name, the last two inside --cache-base.
    pub fn caching_config(&self) -> CachingConfig {
        if let Some(dir) = &self.cache_dir {
            let default_ttl = if self.static_cache {
                i64::MAX
            } else {
                DEFAULT_CACHE_TTL_MS
            };
            return CachingConfig::new(self.cache_ttl_ms.unwrap_or(default_ttl), dir);
        }

        let base = self.cache_base.clone().unwrap_or_else(std::env::temp_dir);
        if self.static_cache {
            CachingConfig::fixed(&base, self.cache_ttl_ms)
        } else {
            CachingConfig::per_run(&base, self.cache_ttl_ms)
        }
    }

    pub fn crawl_config(&self) -> CrawlConfig {
        let mut config = CrawlConfig::new(self.url.clone(), self.caching_config())
            .with_excluded_hosts(&self.exclude_hosts)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }
}

// Only absolute http(s) URLs with a host make sense as a seed
fn parse_seed(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL '{value}': {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("'{value}' is not an http or https URL"));
    }
    if url.host_str().is_none() {
        return Err(format!("'{value}' has no host"));
    }

    Ok(url)
}
