//! Main content location.
//!
//! The locator runs an ordered chain of rules and returns the first match:
//!
//! 1. user hints (tag, id, class or CSS selector), optionally restricted to
//!    the content-type tag first
//! 2. semantic containers, `<main>` then `<article>`
//! 3. built-in id names, then built-in class names, guarded by a minimum
//!    text length
//! 4. the largest non-boilerplate child of `<body>`
//!
//! The matched rule is reported alongside the node for debug output.

use std::fmt;

use crate::config::ExtractionConfig;
use crate::dom::{Document, NodeId};
use crate::{MdScraperError, Result};

/// Tags never chosen by the size fallback.
const NOISE_TAGS: &[&str] = &["nav", "header", "footer", "aside", "script", "style", "form", "noscript"];

/// Semantic content containers, in priority order.
const SEMANTIC_TAGS: &[&str] = &["main", "article"];

type Rule = fn(&Document, &ExtractionConfig) -> Option<LocatedContent>;

const RULES: &[Rule] = &[by_hints, by_semantic_tag, by_signature, by_largest_child];

/// Which rule selected the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateMethod {
    /// A user supplied hint matched.
    Hint { hint: String },
    /// A `<main>` or `<article>` element.
    Semantic { tag: String },
    /// A built-in id or class name matched.
    Signature { attribute: &'static str, name: String },
    /// Largest child of `<body>` by text length.
    LargestChild { tag: String },
}

impl fmt::Display for LocateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hint { hint } => write!(f, "content hint '{}'", hint),
            Self::Semantic { tag } => write!(f, "<{}> element", tag),
            Self::Signature { attribute, name } => write!(f, "container with {} '{}'", attribute, name),
            Self::LargestChild { tag } => write!(f, "largest <{}> child of <body>", tag),
        }
    }
}

/// The element chosen as the main content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedContent {
    pub node: NodeId,
    pub method: LocateMethod,
}

/// Finds the main content subtree of `doc`.
///
/// # Errors
///
/// Returns [`MdScraperError::NoContent`] when no rule finds a non-empty
/// element.
pub fn locate(doc: &Document, config: &ExtractionConfig) -> Result<LocatedContent> {
    let located = RULES
        .iter()
        .find_map(|rule| rule(doc, config))
        .ok_or(MdScraperError::NoContent)?;

    tracing::debug!(method = %located.method, node = located.node.index(), "located main content");
    Ok(located)
}

fn by_hints(doc: &Document, config: &ExtractionConfig) -> Option<LocatedContent> {
    config.content_hints.iter().find_map(|hint| {
        let candidates = hint_candidates(doc, hint);

        let preferred = config
            .content_type_hint
            .as_deref()
            .and_then(|tag| candidates.iter().copied().find(|id| doc.is_tag(*id, tag) && doc.has_content(*id)));

        preferred
            .or_else(|| candidates.iter().copied().find(|id| doc.has_content(*id)))
            .map(|node| LocatedContent { node, method: LocateMethod::Hint { hint: hint.clone() } })
    })
}

/// Elements matching one hint, in document order.
fn hint_candidates(doc: &Document, hint: &str) -> Vec<NodeId> {
    if looks_like_selector(hint) {
        return doc.select(hint).unwrap_or_else(|e| {
            tracing::warn!(hint, error = %e, "ignoring content hint");
            Vec::new()
        });
    }

    let tag = hint.to_ascii_lowercase();
    doc.descendants(doc.root())
        .filter(|id| {
            doc.element(*id)
                .is_some_and(|el| el.name == tag || el.id() == Some(hint) || el.has_class(hint))
        })
        .collect()
}

fn looks_like_selector(hint: &str) -> bool {
    hint.contains(['.', '#', '[', ' ', '>', ':', '*', '+', '~'])
}

fn by_semantic_tag(doc: &Document, _config: &ExtractionConfig) -> Option<LocatedContent> {
    SEMANTIC_TAGS.iter().find_map(|tag| {
        doc.elements_by_tag(doc.root(), tag)
            .into_iter()
            .find(|id| doc.text_len(*id) > 0)
            .map(|node| LocatedContent { node, method: LocateMethod::Semantic { tag: tag.to_string() } })
    })
}

fn by_signature(doc: &Document, config: &ExtractionConfig) -> Option<LocatedContent> {
    let matches_name = |attribute: &'static str, name: &str, id: NodeId| {
        doc.element(id).is_some_and(|el| match attribute {
            "id" => el.id() == Some(name),
            _ => el.has_class(name),
        })
    };

    ["id", "class"].into_iter().find_map(|attribute| {
        config.default_content_names.iter().find_map(|name| {
            doc.descendants(doc.root())
                .filter(|id| matches_name(attribute, name, *id))
                .find(|id| doc.text_len(*id) >= config.min_content_chars)
                .map(|node| LocatedContent { node, method: LocateMethod::Signature { attribute, name: name.clone() } })
        })
    })
}

fn by_largest_child(doc: &Document, _config: &ExtractionConfig) -> Option<LocatedContent> {
    let body = doc.body()?;

    let mut best: Option<(NodeId, usize)> = None;
    for child in doc.element_children(body) {
        if doc.tag_name(child).is_some_and(|tag| NOISE_TAGS.contains(&tag)) {
            continue;
        }
        let len = doc.text_len(child);
        if len > 0 && best.is_none_or(|(_, best_len)| len > best_len) {
            best = Some((child, len));
        }
    }

    best.map(|(node, _)| LocatedContent {
        node,
        method: LocateMethod::LargestChild { tag: doc.tag_name(node).unwrap_or_default().to_string() },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(html: &str, config: &ExtractionConfig) -> (Document, LocatedContent) {
        let doc = Document::parse(html).unwrap();
        let content = locate(&doc, config).unwrap();
        (doc, content)
    }

    #[test]
    fn test_main_wins_without_hints() {
        let html = r#"
            <body>
                <nav>Home About Contact and a much longer navigation text than the main</nav>
                <div class="content">Plenty of text inside a content div that is long enough</div>
                <main><p>Short</p></main>
            </body>
        "#;
        let (doc, content) = located(html, &ExtractionConfig::default());
        assert!(doc.is_tag(content.node, "main"));
        assert_eq!(content.method, LocateMethod::Semantic { tag: "main".to_string() });
    }

    #[test]
    fn test_empty_main_is_skipped() {
        let html = r#"<body><main>  </main><article>Article text</article></body>"#;
        let (doc, content) = located(html, &ExtractionConfig::default());
        assert!(doc.is_tag(content.node, "article"));
    }

    #[test]
    fn test_hint_beats_main() {
        let html = r#"<body><main>Main text</main><div id="docs">Hinted text</div></body>"#;
        let config = ExtractionConfig::builder().content_hints(["docs"]).build();
        let (doc, content) = located(html, &config);
        assert_eq!(doc.text_content(content.node), "Hinted text");
        assert_eq!(content.method, LocateMethod::Hint { hint: "docs".to_string() });
    }

    #[test]
    fn test_hints_tried_in_order() {
        let html = r#"<body><div class="second">B text</div><div class="first">A text</div></body>"#;
        let config = ExtractionConfig::builder().content_hints(["missing", "first", "second"]).build();
        let (doc, content) = located(html, &config);
        assert_eq!(doc.text_content(content.node), "A text");
    }

    #[test]
    fn test_hint_as_css_selector() {
        let html = r#"<body><section data-role="body"><p>Selected</p></section></body>"#;
        let config = ExtractionConfig::builder().content_hints(["section[data-role=body]"]).build();
        let (doc, content) = located(html, &config);
        assert!(doc.is_tag(content.node, "section"));
    }

    #[test]
    fn test_invalid_selector_hint_falls_through() {
        let html = r#"<body><main>Main text</main></body>"#;
        let config = ExtractionConfig::builder().content_hints(["div[["]).build();
        let (doc, content) = located(html, &config);
        assert!(doc.is_tag(content.node, "main"));
    }

    #[test]
    fn test_content_type_hint_prefers_table() {
        let html = r#"
            <body>
                <div class="data">Intro text</div>
                <table class="data"><tr><td>Cell</td></tr></table>
            </body>
        "#;
        let config = ExtractionConfig::builder()
            .content_hints(["data"])
            .content_type_hint(Some("table".to_string()))
            .build();
        let (doc, content) = located(html, &config);
        assert!(doc.is_tag(content.node, "table"));
    }

    #[test]
    fn test_signature_id_before_class() {
        let html = r#"
            <body>
                <div class="content">Class based container with enough text to qualify</div>
                <div id="main-content">Id based container with enough text to qualify</div>
            </body>
        "#;
        let (doc, content) = located(html, &ExtractionConfig::default());
        assert_eq!(doc.attr(content.node, "id"), Some("main-content"));
        assert_eq!(
            content.method,
            LocateMethod::Signature { attribute: "id", name: "main-content".to_string() }
        );
    }

    #[test]
    fn test_signature_threshold_guards_near_empty() {
        let html = r#"
            <body>
                <div class="content">tiny</div>
                <div class="wrapper">A wrapper with a good amount of readable body text.</div>
            </body>
        "#;
        let (doc, content) = located(html, &ExtractionConfig::default());
        assert_eq!(doc.attr(content.node, "class"), Some("wrapper"));
        assert_eq!(content.method, LocateMethod::LargestChild { tag: "div".to_string() });
    }

    #[test]
    fn test_largest_child_skips_noise() {
        let html = r#"
            <body>
                <header>A very long header with lots and lots and lots of words in it</header>
                <div>Short body</div>
                <footer>An even longer footer with lots and lots and lots and lots of words</footer>
            </body>
        "#;
        let (doc, content) = located(html, &ExtractionConfig::default());
        assert_eq!(doc.text_content(content.node), "Short body");
    }

    #[test]
    fn test_no_content() {
        let doc = Document::parse("<html><body><nav>Menu</nav><div>   </div></body></html>").unwrap();
        let result = locate(&doc, &ExtractionConfig::default());
        assert!(matches!(result, Err(MdScraperError::NoContent)));
    }
}
