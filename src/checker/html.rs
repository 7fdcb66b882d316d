// src/checker/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// We also use the `url` crate to resolve every href against the URL of the
// page it was found on. Unlike a plain "give me the good links" helper, the
// crawler needs to know about the bad ones too, so each href comes back as
// either a resolved Url or the raw text plus the parse error.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// One <a href> found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedLink {
    /// The href resolved to an absolute URL
    Resolved(Url),
    /// The href could not be turned into a URL
    Malformed { raw: String, error: url::ParseError },
}

// Extracts all anchor links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   page: the URL of the page (relative links are resolved against it)
//
// Returns: every a[href] in document order. No filtering happens here,
// deciding what is crawlable is the caller's job.
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   page = "https://example.com/guide/"
//   result = [Resolved("https://example.com/docs")]
pub fn extract_html_links(html: &str, page: &Url) -> Vec<ExtractedLink> {
    // Parse the HTML into a document
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| resolve_url(page, href))
        .collect()
}

// Resolves a possibly-relative href to an absolute URL
//
// Url::join handles both cases: an absolute href replaces the base, a relative
// one is resolved against it (like a browser does).
//
// Examples:
//   page = "https://example.com/page"
//   href = "/docs"                    -> Resolved("https://example.com/docs")
//   href = "https://other.com"        -> Resolved("https://other.com/")
//   href = "http://example.com:99999" -> Malformed(InvalidPort)
fn resolve_url(page: &Url, href: &str) -> ExtractedLink {
    match page.join(href) {
        Ok(url) => ExtractedLink::Resolved(url),
        Err(error) => ExtractedLink::Malformed {
            raw: href.to_string(),
            error,
        },
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why return an enum instead of Option<Url>?
//    - The crawler reports malformed links ("bad link syntax") with the exact
//      text that was in the page, so the error can't just be dropped
//
// 2. Why resolve against the page and not the site root?
//    - "../about" on /docs/intro.html means /about, not /../about
//
// 3. Is scraper's Html Send?
//    - No. That's why extraction is a plain synchronous function: the
//      document never lives across an .await point
// -----------------------------------------------------------------------------
