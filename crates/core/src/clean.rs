//! Content cleaning.
//!
//! Steps run in a fixed order, since later ones assume earlier noise is gone:
//! excluded selectors, always-noisy tags and comments, images
//! (`no_images`), links (`no_links`), then whitespace normalization.
//! Cleaning never fails; a step with nothing to remove is a no-op.

use crate::config::ExtractionConfig;
use crate::dom::{Document, NodeData, NodeId};
use crate::locate::LocatedContent;

/// Tags removed regardless of configuration.
const NOISE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Wrappers pruned once the image they held is gone.
const IMAGE_WRAPPERS: &[&str] = &["a", "picture", "figure", "p", "span"];

/// Elements that carry meaning without text.
const CONTENTLESS_TAGS: &[&str] = &["img", "br", "hr"];

/// Cleans the located content in place and returns its root.
pub fn clean(doc: &mut Document, content: &LocatedContent, config: &ExtractionConfig) -> NodeId {
    let root = content.node;

    remove_excluded(doc, root, &config.exclude_selectors);
    remove_noise(doc, root);
    if config.no_images {
        remove_images(doc, root);
    }
    if config.no_links {
        unwrap_links(doc, root);
    }
    normalize_whitespace(doc, root);

    root
}

fn remove_excluded(doc: &mut Document, root: NodeId, selectors: &[String]) {
    for selector in selectors {
        match doc.select_within(root, selector) {
            Ok(matches) => {
                tracing::debug!(selector = %selector, count = matches.len(), "removing excluded elements");
                for id in matches {
                    doc.detach(id);
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping exclude selector"),
        }
    }
}

fn remove_noise(doc: &mut Document, root: NodeId) {
    let noisy: Vec<NodeId> = doc
        .descendants(root)
        .filter(|id| match &doc.node(*id).data {
            NodeData::Comment(_) => true,
            NodeData::Element(el) => NOISE_TAGS.contains(&el.name.as_str()),
            _ => false,
        })
        .collect();

    for id in noisy {
        doc.detach(id);
    }
}

fn remove_images(doc: &mut Document, root: NodeId) {
    let images = doc.elements_by_tag(root, "img");
    tracing::debug!(count = images.len(), "removing images");

    for img in images {
        let mut parent = doc.parent(img);
        doc.detach(img);

        while let Some(wrapper) = parent {
            let prunable = wrapper != root
                && doc.tag_name(wrapper).is_some_and(|tag| IMAGE_WRAPPERS.contains(&tag))
                && !doc.has_content(wrapper);
            if !prunable {
                break;
            }
            parent = doc.parent(wrapper);
            doc.detach(wrapper);
        }
    }
}

fn unwrap_links(doc: &mut Document, root: NodeId) {
    let links = doc.elements_by_tag(root, "a");
    tracing::debug!(count = links.len(), "replacing links with their text");

    for link in links {
        if doc.is_inside(link, root) {
            let text = doc.text_content(link);
            doc.replace_with_text(link, &text);
        }
    }
}

fn normalize_whitespace(doc: &mut Document, root: NodeId) {
    let mut elements: Vec<NodeId> = doc.descendants(root).filter(|id| doc.element(*id).is_some()).collect();
    elements.push(root);

    for id in elements {
        doc.merge_adjacent_text(id);
        let blank: Vec<NodeId> = doc
            .children(id)
            .iter()
            .copied()
            .filter(|c| doc.text(*c).is_some_and(|t| t.trim().is_empty() && t != " "))
            .collect();
        for text in blank {
            doc.set_text(text, " ".to_string());
        }
    }

    while let Some(first) = doc.children(root).first().copied() {
        if !is_empty_node(doc, first) {
            break;
        }
        doc.detach(first);
    }
    while let Some(last) = doc.children(root).last().copied() {
        if !is_empty_node(doc, last) {
            break;
        }
        doc.detach(last);
    }
}

fn is_empty_node(doc: &Document, id: NodeId) -> bool {
    match &doc.node(id).data {
        NodeData::Text(text) => text.trim().is_empty(),
        NodeData::Element(el) => !CONTENTLESS_TAGS.contains(&el.name.as_str()) && !doc.has_content(id),
        _ => true,
    }
}
