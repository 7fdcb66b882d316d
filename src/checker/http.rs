// src/checker/http.rs
// =============================================================================
// This module fetches pages over HTTP.
//
// Key functionality:
// - PageSource: "give me the body of this URL", the seam the page cache uses
//   on a miss (tests swap in an in-memory source)
// - HttpSource: the real implementation on top of reqwest
// - Detects various failure modes (404, timeout, TLS errors, etc.) and turns
//   them into a FetchError the crawler can report as a broken link
//
// Every request has a timeout. A fetch that never finishes would keep the
// crawl from ever reaching zero outstanding tasks.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::FetchError;

/// Something that can produce the text of a page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

// Fetches pages with a shared reqwest client
//
// Client is cheap to clone and pools connections internally, so one
// HttpSource serves every worker.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    // Builds the HTTP client
    //
    // Parameters:
    //   timeout: applies to connecting and to the whole request
    //   user_agent: sent with every request
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(categorize_error)?;

        // Anything outside 2xx (after redirects) means the link is broken
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - TLS certificate issues
// - Too many redirects
fn categorize_error(error: reqwest::Error) -> FetchError {
    // Convert error to string once, the DNS/TLS checks look at the message
    let error_string = error.to_string();
    let lowered = error_string.to_lowercase();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if lowered.contains("dns") {
            FetchError::Dns(error_string)
        } else {
            FetchError::Connect(error_string)
        }
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        FetchError::Tls(error_string)
    } else if error.is_body() || error.is_decode() {
        FetchError::Body(error_string)
    } else {
        FetchError::Request(error_string)
    }
}
