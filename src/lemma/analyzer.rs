//! Lemma Analyzer (C3): text/HTML -> `lemma -> occurrence_count`.
//!
//! Pure and thread-safe once constructed; no I/O after initialization. The
//! morphological dictionaries that would give exact lemmatization are
//! explicitly out of scope (spec.md §1), so this analyzer runs a simplified
//! pipeline that still honors every documented step: strip HTML, tokenize,
//! detect script, drop functional-class words, and take a single normal
//! form per token.

use std::collections::HashMap;

use regex::Regex;
use scraper::{Html, Selector};

use super::stopwords::{is_english_functional, is_russian_functional};
use crate::errors::{IndexError, IndexResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Russian,
    English,
    Other,
}

fn classify_script(token: &str) -> Script {
    let is_cyrillic = token
        .chars()
        .all(|c| ('\u{0400}'..='\u{04FF}').contains(&c));
    if is_cyrillic && !token.is_empty() {
        return Script::Russian;
    }
    let is_latin = token.chars().all(|c| c.is_ascii_alphabetic());
    if is_latin && !token.is_empty() {
        return Script::English;
    }
    Script::Other
}

/// Minimal suffix-stripping normalizer standing in for full English
/// lemmatization (spec.md §4.3 step e). Not a Porter stemmer — just enough
/// to fold a few common inflections onto one key.
fn normalize_english(token: &str) -> String {
    for suffix in ["ing", "ed", "es", "s"] {
        if token.len() > suffix.len() + 2 {
            if let Some(stem) = token.strip_suffix(suffix) {
                return stem.to_string();
            }
        }
    }
    token.to_string()
}

/// Extracts lemma occurrence counts from HTML or plain text.
pub struct LemmaAnalyzer {
    token_re: Regex,
}

impl LemmaAnalyzer {
    /// Construct the analyzer. Fallible once, per spec.md §4.3
    /// (`ANALYZER_INIT_ERROR`) — in practice the embedded pattern always
    /// compiles, but the fallible shape is kept so a future data-driven
    /// tokenizer can fail the same way.
    pub fn new() -> IndexResult<Self> {
        let token_re = Regex::new(r"[^\W\d_]+")
            .map_err(|e| IndexError::AnalyzerInit(e.to_string()))?;
        Ok(Self { token_re })
    }

    /// Strip HTML down to visible text: drop `<script>`/`<style>` contents
    /// and concatenate the remaining text nodes.
    fn visible_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);

        let excluded: std::collections::HashSet<_> = Selector::parse("script, style")
            .ok()
            .map(|selector| {
                document
                    .select(&selector)
                    .flat_map(|el| el.descendants().map(|d| d.id()))
                    .collect()
            })
            .unwrap_or_default();

        document
            .root_element()
            .descendants()
            .filter(|node| !excluded.contains(&node.id()))
            .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Extract `lemma -> occurrence_count` from an HTML document.
    #[must_use]
    pub fn analyze_html(&self, html: &str) -> HashMap<String, u32> {
        self.analyze_text(&self.visible_text(html))
    }

    /// Extract `lemma -> occurrence_count` from plain text.
    #[must_use]
    pub fn analyze_text(&self, text: &str) -> HashMap<String, u32> {
        let mut counts: HashMap<String, u32> = HashMap::new();

        for raw in self.token_re.find_iter(text) {
            let token = raw.as_str().to_lowercase();
            match classify_script(&token) {
                Script::Russian => {
                    if is_russian_functional(&token) {
                        continue;
                    }
                    *counts.entry(token).or_insert(0) += 1;
                }
                Script::English => {
                    if is_english_functional(&token) {
                        continue;
                    }
                    let lemma = normalize_english(&token);
                    *counts.entry(lemma).or_insert(0) += 1;
                }
                Script::Other => continue,
            }
        }

        counts
    }

    /// Distinct lemma keys for a piece of text — used by the (out-of-scope)
    /// search subsystem to build a query's candidate lemma set.
    #[must_use]
    pub fn lemma_set(&self, text: &str) -> std::collections::HashSet<String> {
        self.analyze_text(text).into_keys().collect()
    }
}
