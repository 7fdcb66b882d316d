// src/crawl/cache.rs
// =============================================================================
// Disk-backed page cache.
//
// Layout: one file per URL directly inside the cache directory.
//
//   <cache dir>/
//     https%3A%2F%2Fexample.com%2Fdocs%2F        # page text, as fetched
//     https%3A%2F%2Fexample.com%2Fa-very-lo...-<sha256>
//
// Freshness comes from the file's modification time, nothing else is stored.
// Writes go to a uniquely named temp file that is renamed over the entry, so
// a reader never sees half a page.
// =============================================================================

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};
use url::Url;

use crate::checker::PageSource;
use crate::config::CachingConfig;
use crate::error::{CrawlError, FetchError};

// Longest percent-encoded key used as-is. Most filesystems cap names at 255.
const MAX_KEY_LEN: usize = 200;
// How much of an over-long key is kept before the digest
const KEY_PREFIX_LEN: usize = 120;

/// Page text by URL, from disk when fresh, from the network otherwise.
pub struct PageCache {
    config: CachingConfig,
    source: Arc<dyn PageSource>,
}

impl PageCache {
    pub fn new(config: CachingConfig, source: Arc<dyn PageSource>) -> Self {
        Self { config, source }
    }

    /// Create the cache directory if it is missing.
    pub async fn ensure_dir(&self) -> Result<(), CrawlError> {
        let dir = self.config.dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| CrawlError::CacheDir {
                path: dir.to_path_buf(),
                source,
            })?;
        debug!("using page cache at {}", dir.display());
        Ok(())
    }

    /// File holding the cached text for `url`.
    pub fn entry_path(&self, url: &Url) -> PathBuf {
        self.config.dir().join(cache_key(url))
    }

    /// Return the text of `url`, from the cache when it is fresh.
    ///
    /// A miss or stale entry fetches from the network and rewrites the entry.
    /// Failing to write the entry is logged; the page is still returned.
    pub async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let path = self.entry_path(url);

        if let Some(page) = self.read_fresh(&path).await {
            debug!("cache hit {url}");
            return Ok(page);
        }

        let page = self.source.fetch(url).await?;
        debug!("fetched {url} ({} bytes)", page.len());

        if let Err(e) = self.store(&path, &page).await {
            warn!("failed to cache {url} at {}: {e}", path.display());
        }

        Ok(page)
    }

    // Some(text) only for an entry younger than the TTL that can be read
    async fn read_fresh(&self, path: &Path) -> Option<String> {
        let ttl = self.config.ttl()?;

        let modified = tokio::fs::metadata(path).await.ok()?.modified().ok()?;
        // A timestamp in the future counts as brand new
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age >= ttl {
            debug!("stale cache entry {}", path.display());
            return None;
        }

        match tokio::fs::read_to_string(path).await {
            Ok(page) => Some(page),
            Err(e) => {
                debug!("unreadable cache entry {}: {e}", path.display());
                None
            }
        }
    }

    async fn store(&self, path: &Path, page: &str) -> std::io::Result<()> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp_path, page).await?;

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

// Percent-encodes the whole URL so it is a single safe file name.
// Over-long keys keep a readable prefix and end in a SHA-256 of the URL.
fn cache_key(url: &Url) -> String {
    let encoded = urlencoding::encode(url.as_str());
    if encoded.len() <= MAX_KEY_LEN {
        return encoded.into_owned();
    }

    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    // Percent-encoded text is ASCII, any byte index is a char boundary
    format!("{}-{digest}", &encoded[..KEY_PREFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::StubSource;
    use std::time::Duration;
    use tempfile::TempDir;

    const PAGE: &str = "http://site.test/index.html";

    fn cache_with(dir: &Path, ttl_ms: i64, source: Arc<StubSource>) -> PageCache {
        PageCache::new(CachingConfig::new(ttl_ms, dir), source)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_disk() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(StubSource::new().page(PAGE, "<html>hello</html>\n"));
        let cache = cache_with(temp.path(), 60_000, source.clone());

        let first = cache.fetch_page(&url(PAGE)).await.unwrap();
        let second = cache.fetch_page(&url(PAGE)).await.unwrap();

        assert_eq!(first, "<html>hello</html>\n");
        assert_eq!(first, second);
        assert_eq!(source.fetch_count(PAGE), 1);

        let on_disk = std::fs::read_to_string(cache.entry_path(&url(PAGE))).unwrap();
        assert_eq!(on_disk, first);
    }

    #[tokio::test]
    async fn test_entries_survive_a_new_cache_instance() {
        let temp = TempDir::new().unwrap();
        let first_run = Arc::new(StubSource::new().page(PAGE, "cached body"));
        cache_with(temp.path(), 60_000, first_run)
            .fetch_page(&url(PAGE))
            .await
            .unwrap();

        // Second run has no network at all
        let second_run = Arc::new(StubSource::new());
        let page = cache_with(temp.path(), 60_000, second_run.clone())
            .fetch_page(&url(PAGE))
            .await
            .unwrap();

        assert_eq!(page, "cached body");
        assert_eq!(second_run.total_fetches(), 0);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(StubSource::new().page(PAGE, "fresh"));
        let cache = cache_with(temp.path(), 60_000, source.clone());

        cache.fetch_page(&url(PAGE)).await.unwrap();

        // Age the entry past the TTL
        let path = cache.entry_path(&url(PAGE));
        std::fs::write(&path, "old").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        let page = cache.fetch_page(&url(PAGE)).await.unwrap();

        assert_eq!(page, "fresh");
        assert_eq!(source.fetch_count(PAGE), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(StubSource::new().page(PAGE, "body"));
        let cache = cache_with(temp.path(), 0, source.clone());

        cache.fetch_page(&url(PAGE)).await.unwrap();
        cache.fetch_page(&url(PAGE)).await.unwrap();

        assert_eq!(source.fetch_count(PAGE), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(StubSource::new());
        let cache = cache_with(temp.path(), 60_000, source);

        let err = cache.fetch_page(&url(PAGE)).await.unwrap_err();

        assert!(matches!(err, FetchError::Connect(_)));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(StubSource::new().page(PAGE, "body"));
        let cache = cache_with(temp.path(), 0, source);

        cache.fetch_page(&url(PAGE)).await.unwrap();
        cache.fetch_page(&url(PAGE)).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![cache_key(&url(PAGE))]);
    }

    #[tokio::test]
    async fn test_failed_cache_write_still_returns_page() {
        let temp = TempDir::new().unwrap();
        // Never created, so every write fails
        let missing = temp.path().join("missing");
        let source = Arc::new(StubSource::new().page(PAGE, "body"));
        let cache = cache_with(&missing, 60_000, source.clone());

        let page = cache.fetch_page(&url(PAGE)).await.unwrap();

        assert_eq!(page, "body");
        assert_eq!(source.fetch_count(PAGE), 1);
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_unreadable_entry_falls_through_to_network() {
        let temp = TempDir::new().unwrap();
        let source = Arc::new(StubSource::new().page(PAGE, "body"));
        let cache = cache_with(temp.path(), 60_000, source.clone());

        // Fresh by mtime, but a directory cannot be read as text
        std::fs::create_dir(cache.entry_path(&url(PAGE))).unwrap();

        let page = cache.fetch_page(&url(PAGE)).await.unwrap();

        assert_eq!(page, "body");
        assert_eq!(source.fetch_count(PAGE), 1);
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        let cache = cache_with(&dir, 1000, Arc::new(StubSource::new()));

        cache.ensure_dir().await.unwrap();

        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_failure_is_fatal_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let cache = cache_with(&blocker.join("cache"), 1000, Arc::new(StubSource::new()));

        let err = cache.ensure_dir().await.unwrap_err();

        assert!(matches!(err, CrawlError::CacheDir { .. }));
    }

    #[test]
    fn test_cache_key_is_single_path_component() {
        let key = cache_key(&url("https://example.com/docs/a b?q=1&r=2"));
        assert!(!key.contains('/'));
        assert!(!key.contains('?'));
        assert_eq!(key, "https%3A%2F%2Fexample.com%2Fdocs%2Fa%2520b%3Fq%3D1%26r%3D2");
    }

    #[test]
    fn test_long_cache_keys_are_hashed() {
        let long_a = url(&format!("https://example.com/{}a", "x".repeat(300)));
        let long_b = url(&format!("https://example.com/{}b", "x".repeat(300)));

        let key_a = cache_key(&long_a);
        let key_b = cache_key(&long_b);

        assert!(key_a.len() <= KEY_PREFIX_LEN + 1 + 64);
        assert_ne!(key_a, key_b);
        assert_eq!(key_a, cache_key(&long_a));
    }
}
