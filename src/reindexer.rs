//! Single-page Re-indexer (C10): re-fetch and re-index exactly one URL on
//! demand, outside the normal crawl (spec.md §4.10).
//!
//! Shares `LemmaIndexWriter` with the [`crate::scheduler::CrawlScheduler`]
//! rather than calling back into it directly — the dependency-inversion fix
//! recorded in spec.md §9 for the module cycle the source exhibited.

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::errors::{IndexError, IndexResult};
use crate::fetch::{is_binary_url, is_supported_scheme, Fetcher};
use crate::lemma::LemmaAnalyzer;
use crate::lemma_writer::LemmaIndexWriter;
use crate::normalize::{normalize, path_of};

pub struct SinglePageReindexer {
    fetcher: Arc<dyn Fetcher>,
    analyzer: Arc<LemmaAnalyzer>,
    writer: Arc<LemmaIndexWriter>,
    binary_extensions: HashSet<String>,
}

impl SinglePageReindexer {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        analyzer: Arc<LemmaAnalyzer>,
        writer: Arc<LemmaIndexWriter>,
        binary_extensions: HashSet<String>,
    ) -> Self {
        Self {
            fetcher,
            analyzer,
            writer,
            binary_extensions,
        }
    }

    /// Re-index `url`: locate its configured site by host, fetch it fresh,
    /// retire the page's old index rows and decrement their lemma
    /// frequencies, then re-save the page and its current lemma counts.
    ///
    /// Returns `Ok(true)` once the page has been (re)indexed, `Ok(false)`
    /// if `url` names a binary/unsupported resource that is skipped without
    /// error, and `Err(OutOfScope)` if `url`'s host matches none of the
    /// configured sites (spec.md §4.10 step 1).
    pub async fn index_page(&self, url: &str) -> IndexResult<bool> {
        let normalized = normalize(url);
        if !normalized.is_fetchable() {
            return Err(IndexError::MalformedUrl(url.to_string()));
        }

        let parsed = Url::parse(&normalized.url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| IndexError::MalformedUrl(url.to_string()))?;

        if !is_supported_scheme(parsed.scheme()) || is_binary_url(&normalized.url, &self.binary_extensions) {
            return Ok(false);
        }

        let site = self
            .writer
            .store()
            .find_site_by_host(host)
            .await?
            .ok_or(IndexError::OutOfScope)?;

        let fetched = self.fetcher.fetch(&normalized.url).await?;
        let path = path_of(&normalized.url)?;

        let page = match self.writer.store().find_page(site.id, &path).await? {
            Some(existing) => {
                let deleted = self.writer.store().delete_indices_for_page(existing.id).await?;
                self.writer.store().adjust_lemma_frequencies(&deleted).await?;
                self.writer
                    .store()
                    .update_page_content(existing.id, i32::from(fetched.status_code), &fetched.document)
                    .await?;
                existing
            }
            None => {
                self.writer
                    .store()
                    .save_page(site.id, &path, i32::from(fetched.status_code), &fetched.document)
                    .await?
            }
        };

        let counts = self.analyzer.analyze_html(&fetched.document);
        self.writer
            .save_lemmas_and_indices(site.id, page.id, counts)
            .await?;

        Ok(true)
    }
}
