//! `<a href>` extraction for the Crawl Scheduler (spec.md §4.7's "Process
//! page" step 5).
//!
//! Parses the fetched document with `scraper` — the same crate the Lemma
//! Analyzer already uses for HTML traversal (`lemma::analyzer`) — and
//! resolves every `href` against the page's base URL with `Url::join`,
//! the resolution idiom the teacher crate uses for inlined assets
//! (`inline_css::utils::resolve`).

use scraper::{Html, Selector};
use url::Url;

/// Extract every absolute `<a href>` target on the page, resolved against
/// `base`. Unparsable hrefs (`javascript:`, empty, malformed) are skipped
/// rather than surfaced as errors — link discovery is best-effort.
#[must_use]
pub fn extract_links(html: &str, base: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}
