// src/checker/mod.rs
// =============================================================================
// Page fetching and link extraction.
//
// Submodules:
// - http: fetches page bodies over HTTP (PageSource / HttpSource)
// - html: extracts and resolves links from HTML pages
// =============================================================================

mod html;
mod http;

pub use html::{extract_html_links, ExtractedLink};
pub use http::{HttpSource, PageSource};
