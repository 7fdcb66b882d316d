// src/crawl/testing.rs
// =============================================================================
// Test doubles shared by the crawl tests:
// - StubSource: an in-memory PageSource that counts fetches per URL
// - RecordingSink: a ReportSink that remembers every event
// =============================================================================

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use url::Url;

use crate::checker::PageSource;
use crate::error::{CrawlError, FetchError};
use crate::report::ReportSink;

// Pages not registered with `page` behave like a refused connection
#[derive(Default)]
pub struct StubSource {
    pages: HashMap<String, String>,
    panics: HashSet<String>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Fetching `url` panics, standing in for a bug inside a task.
    pub fn panicking(mut self, url: &str) -> Self {
        self.panics.insert(url.to_string());
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PageSource for StubSource {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        // Give other tasks a chance to interleave
        tokio::task::yield_now().await;

        if self.panics.contains(url.as_str()) {
            panic!("boom while fetching {url}");
        }

        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Connect("connection refused".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started,
    Finished,
    Crawling {
        uri: String,
        completed: usize,
        total: usize,
    },
    Broken { page: Option<String>, target: String },
    BadSyntax { page: String, raw: String },
    Error(String),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ReportSink for RecordingSink {
    fn started(&self) {
        self.push(Event::Started);
    }

    fn finished(&self) {
        self.push(Event::Finished);
    }

    fn crawling(&self, uri: &Url, completed: usize, total: usize) {
        self.push(Event::Crawling {
            uri: uri.to_string(),
            completed,
            total,
        });
    }

    fn broken_link(&self, page: Option<&Url>, target: &Url, _cause: &FetchError) {
        self.push(Event::Broken {
            page: page.map(Url::to_string),
            target: target.to_string(),
        });
    }

    fn bad_link_syntax(&self, page: &Url, raw_target: &str, _cause: &url::ParseError) {
        self.push(Event::BadSyntax {
            page: page.to_string(),
            raw: raw_target.to_string(),
        });
    }

    fn error(&self, error: &CrawlError) {
        self.push(Event::Error(error.to_string()));
    }
}
