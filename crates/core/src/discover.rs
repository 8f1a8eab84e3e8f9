//! Same-site link discovery for site mode.
//!
//! Every `<a href>` in the document is resolved against the seed URL and
//! kept when it stays on the seed's scheme and host. URLs are normalized so
//! the same page is only listed once: the fragment is dropped, a trailing
//! slash is removed (except on the bare root) and the query is kept.

use std::collections::BTreeSet;

use glob::{MatchOptions, Pattern};
use url::Url;

use crate::dom::Document;
use crate::{MdScraperError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Glob patterns matched against the last path segment of a discovered link.
#[derive(Debug, Clone, Default)]
pub struct ExcludePatterns {
    patterns: Vec<Pattern>,
}

impl ExcludePatterns {
    /// Compiles `patterns`, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`MdScraperError::InvalidPattern`] for the first pattern that
    /// is not a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| MdScraperError::InvalidPattern(format!("{}: {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether the last path segment of `url` matches any pattern.
    pub fn matches(&self, url: &Url) -> bool {
        let segment = url.path().split('/').rev().find(|s| !s.is_empty()).unwrap_or_default();
        self.patterns.iter().any(|p| p.matches_with(segment, MATCH_OPTIONS))
    }
}

/// De-duplicated, ordered set of discovered page URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteLinkSet {
    links: BTreeSet<Url>,
}

impl SiteLinkSet {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.links.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.links.iter()
    }

    pub fn into_vec(self) -> Vec<Url> {
        self.links.into_iter().collect()
    }
}

impl IntoIterator for SiteLinkSet {
    type Item = Url;
    type IntoIter = std::collections::btree_set::IntoIter<Url>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

/// Collects same-site links from the whole of `doc`.
///
/// The seed page itself is never part of the result, and neither is any
/// link whose last path segment matches `exclude`. Unresolvable hrefs are
/// skipped.
pub fn discover(doc: &Document, seed: &Url, exclude: &ExcludePatterns) -> SiteLinkSet {
    let seed_key = normalize(seed.clone());
    let mut links = BTreeSet::new();

    for anchor in doc.elements_by_tag(doc.root(), "a") {
        let Some(href) = doc.attr(anchor, "href").map(str::trim).filter(|h| !h.is_empty()) else {
            continue;
        };

        let url = match seed.join(href) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Failed to resolve link '{}' against '{}': {}", href, seed, e);
                continue;
            }
        };

        if !matches!(url.scheme(), "http" | "https")
            || url.scheme() != seed.scheme()
            || url.host_str() != seed.host_str()
            || url.port_or_known_default() != seed.port_or_known_default()
        {
            continue;
        }

        let url = normalize(url);
        if url == seed_key || exclude.matches(&url) {
            continue;
        }
        links.insert(url);
    }

    tracing::debug!("Discovered {} same-site links from {}", links.len(), seed);
    SiteLinkSet { links }
}

fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }
    url
}
