//! URL Normalizer (C1).
//!
//! Produces the canonical form of a URL used as the key for every
//! deduplication and persistence decision downstream: the Visited Set, the
//! `PageUrlCache`, and `Page.path`.

use url::Url;

use crate::errors::{IndexError, IndexResult};

/// Outcome of normalizing a URL.
///
/// `MALFORMED_URL` is not a hard failure from the caller's point of view —
/// the normalizer still returns its best-effort lowercased, slash-collapsed
/// string, but flags it as non-fetchable so callers skip it rather than
/// handing it to the Fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub url: String,
    pub malformed: bool,
}

impl Normalized {
    #[must_use]
    pub fn is_fetchable(&self) -> bool {
        !self.malformed
    }
}

/// Normalize `input`, which may be a relative URL already absolutized
/// against a base by the caller.
///
/// Rules, applied in order (spec.md §4.1):
/// (a) lowercase scheme and host
/// (b) strip default port
/// (c) drop fragment
/// (d) collapse repeated `/` in the path
/// (e) remove a trailing `/` except when the path is just `/`
/// (f) empty path becomes `/`
/// (g) query is left untouched
#[must_use]
pub fn normalize(input: &str) -> Normalized {
    let Ok(mut url) = Url::parse(input) else {
        return Normalized {
            url: best_effort(input),
            malformed: true,
        };
    };

    if url.host_str().is_none() {
        return Normalized {
            url: best_effort(input),
            malformed: true,
        };
    }

    // (a) lowercase scheme and host
    let scheme = url.scheme().to_ascii_lowercase();
    if url.set_scheme(&scheme).is_err() {
        return Normalized {
            url: best_effort(input),
            malformed: true,
        };
    }
    if let Some(host) = url.host_str() {
        let lower = host.to_ascii_lowercase();
        if lower != host {
            let _ = url.set_host(Some(&lower));
        }
    }

    // (b) strip default port
    if let Some(port) = url.port() {
        let is_default = matches!((url.scheme(), port), ("http", 80) | ("https", 443));
        if is_default {
            let _ = url.set_port(None);
        }
    }

    // (c) drop fragment
    url.set_fragment(None);

    // (d)-(f) collapse slashes, drop trailing slash, empty -> "/"
    let collapsed = collapse_path(url.path());
    url.set_path(&collapsed);

    Normalized {
        url: url.as_str().to_string(),
        malformed: false,
    }
}

/// Collapse repeated `/` runs and drop a trailing `/`, except the root path.
fn collapse_path(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(ch);
    }

    if collapsed.is_empty() {
        return "/".to_string();
    }
    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }
    collapsed
}

/// Lowercase and collapse slashes without requiring a valid `Url` parse,
/// for the `MALFORMED_URL` fallback path.
fn best_effort(input: &str) -> String {
    let lowered = input.to_ascii_lowercase();
    collapse_path(&lowered)
}

/// De-www a host for comparison purposes (spec.md §4.1(c), §9's Open Question).
fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Internality test (C7's link filter): is `candidate_host` part of the
/// site rooted at `seed_host`?
///
/// This rewrite adopts the exact-suffix rule recorded in spec.md §9 rather
/// than the source's raw substring match: `sub.example.com` is internal to
/// `example.com`, but `notexample.com` is not. See DESIGN.md for the
/// rejected substring alternative.
#[must_use]
pub fn is_internal(candidate_host: &str, seed_host: &str) -> bool {
    let candidate = strip_www(&candidate_host.to_ascii_lowercase()).to_string();
    let seed = strip_www(&seed_host.to_ascii_lowercase()).to_string();

    candidate == seed || candidate.ends_with(&format!(".{seed}"))
}

/// The site-relative path of an already-normalized URL, used as `Page.path`
/// (spec.md §4.6).
pub fn path_of(normalized_url: &str) -> IndexResult<String> {
    let parsed = Url::parse(normalized_url)
        .map_err(|_| IndexError::MalformedUrl(normalized_url.to_string()))?;
    Ok(parsed.path().to_string())
}
