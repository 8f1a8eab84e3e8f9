//! In-site link rewriting for offline exports.
//!
//! Links that point at or below the configured root URL are rewritten to
//! relative paths of the Markdown files a site export produces (see
//! [`crate::naming::relative_markdown_path`]). Fragments are kept; links
//! elsewhere are untouched.

use url::Url;

use crate::dom::{Document, NodeId};
use crate::naming::{relative_markdown_path, relative_path};

/// A link that could not be interpreted and was left as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWarning {
    pub href: String,
    pub reason: String,
}

/// Rewrites in-site links below `root` to relative Markdown paths.
///
/// Relative hrefs are resolved against `source_url` when given, otherwise
/// against `root_url`. Returns one warning per malformed href; those links
/// are not modified. Does nothing when `root_url` is `None`.
pub fn rewrite_links(
    doc: &mut Document, root: NodeId, root_url: Option<&Url>, source_url: Option<&Url>,
) -> Vec<LinkWarning> {
    let Some(root_url) = root_url else {
        return Vec::new();
    };

    let base = source_url.unwrap_or(root_url);
    let current_file = source_url
        .and_then(|source| relative_markdown_path(root_url, source))
        .unwrap_or_default();

    let links: Vec<NodeId> = doc.elements_by_tag(root, "a");
    let mut warnings = Vec::new();
    let mut rewritten = 0usize;

    for link in links {
        let Some(href) = doc.attr(link, "href").map(|h| h.trim().to_string()) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        let target = match Url::options().base_url(Some(base)).parse(&href) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(href = %href, error = %e, "leaving malformed link unmodified");
                warnings.push(LinkWarning { href, reason: e.to_string() });
                continue;
            }
        };

        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }

        if let Some(target_file) = relative_markdown_path(root_url, &target) {
            let mut new_href = relative_path(&current_file, &target_file);
            if let Some(fragment) = target.fragment() {
                new_href.push('#');
                new_href.push_str(fragment);
            }
            doc.set_attr(link, "href", &new_href);
            rewritten += 1;
        }
    }

    tracing::debug!(rewritten, warnings = warnings.len(), "rewrote in-site links");
    warnings
}
