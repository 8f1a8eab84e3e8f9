//! HTML parsing and the mutable document tree.
//!
//! This module provides [`Document`], an arena of [`Node`]s built from
//! scraper's lenient HTML5 parse. Nodes are addressed by [`NodeId`] and keep
//! a non-owning parent index, so subtrees can be detached, unwrapped and
//! rewritten in place without reference cycles.
//!
//! # Example
//!
//! ```rust
//! use mdscraper_core::dom::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Test Page</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! assert_eq!(doc.title(), Some("Test Page".to_string()));
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(doc.text_content(paragraphs[0]), "Paragraph");
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::bytes;
use scraper::{Html, Selector};
use url::Url;

use crate::{MdScraperError, Result, preprocess};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tag name and attributes of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub name: String,
    /// Attribute name to value, names unique.
    pub attrs: BTreeMap<String, String>,
}

impl ElementData {
    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Gets the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Iterates the whitespace separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// Whether the `class` attribute contains `name`.
    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|c| c == name)
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node, `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,
    /// Ordered children.
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// A parsed, mutable HTML document.
///
/// The arena is filled in document (pre-)order, which keeps node indices
/// aligned with scraper's own tree so CSS selectors can be evaluated by
/// scraper and mapped back onto arena nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Malformed or unclosed markup is recovered the way browsers do.
    ///
    /// # Errors
    ///
    /// Returns [`MdScraperError::Parse`] if the input is empty or contains no
    /// markup at all.
    pub fn parse(html: &str) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(MdScraperError::Parse("empty document".to_string()));
        }
        if !html.contains('<') {
            return Err(MdScraperError::Parse("payload contains no HTML markup".to_string()));
        }

        let parsed = Html::parse_document(html);
        let mut nodes: Vec<Node> = Vec::new();
        let mut index = HashMap::new();

        for node in parsed.tree.root().descendants() {
            let id = NodeId(nodes.len());
            index.insert(node.id(), id);

            let parent = node.parent().and_then(|p| index.get(&p.id()).copied());
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }

            nodes.push(Node { parent, children: Vec::new(), data: convert_node(node.value()) });
        }

        let doc = Self { nodes, html: parsed };
        if doc.document_element().is_none() {
            return Err(MdScraperError::Parse("no root element".to_string()));
        }
        Ok(doc)
    }

    /// Parses HTML, first resolving relative `href`/`src` values against
    /// `base_url`.
    pub fn parse_with_base(html: &str, base_url: Option<&Url>) -> Result<Self> {
        match base_url {
            Some(base) => Self::parse(&preprocess::absolutize_urls(html, base)),
            None => Self::parse(html),
        }
    }

    /// Decodes raw bytes with [`decode_html`] and parses them.
    pub fn from_bytes(raw: &[u8], declared_encoding: Option<&str>) -> Result<Self> {
        Self::parse(&decode_html(raw, declared_encoding))
    }

    /// The document root (the node above `<html>`).
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Gets a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Gets the element payload of a node, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Gets the lowercase tag name of an element node.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    /// Whether `id` is an element with tag `name`.
    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id) == Some(name)
    }

    /// Gets an attribute of an element node.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    /// Sets (or replaces) an attribute of an element node.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.0].data {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Gets the text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Element children of a node.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.element(*c).is_some())
    }

    /// Iterates every node below `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Iterates the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |p| self.parent(*p))
    }

    /// Whether `id` is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    /// Whether `id` lies strictly inside the subtree rooted at `scope`.
    pub fn is_inside(&self, id: NodeId, scope: NodeId) -> bool {
        self.ancestors(id).any(|a| a == scope)
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).next()
    }

    /// The `<body>` element.
    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag(self.root(), "body")
    }

    /// First element below `scope` with the given tag name.
    pub fn first_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope).find(|id| self.is_tag(*id, tag))
    }

    /// All elements below `scope` with the given tag name, in document order.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope).filter(|id| self.is_tag(*id, tag)).collect()
    }

    /// Selects attached elements using a CSS selector.
    ///
    /// Selectors are evaluated against the document as it was parsed;
    /// nodes detached since then are filtered out.
    ///
    /// # Errors
    ///
    /// Returns [`MdScraperError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        let sel = Selector::parse(selector)
            .map_err(|e| MdScraperError::InvalidSelector(format!("{}: {}", selector, e)))?;

        let matched: HashSet<_> = self.html.select(&sel).map(|el| el.id()).collect();
        if matched.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .html
            .tree
            .root()
            .descendants()
            .enumerate()
            .filter(|(_, node)| matched.contains(&node.id()))
            .map(|(i, _)| NodeId(i))
            .filter(|id| self.is_attached(*id))
            .collect())
    }

    /// Selects elements strictly inside `scope` using a CSS selector.
    pub fn select_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        Ok(self
            .select(selector)?
            .into_iter()
            .filter(|id| self.is_inside(*id, scope))
            .collect())
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id).filter_map(|d| self.text(d)).collect()
    }

    /// Length in characters of the trimmed text below `id`.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text_content(id).trim().chars().count()
    }

    /// Whether the subtree holds visible text or an image.
    pub fn has_content(&self, id: NodeId) -> bool {
        self.text_len(id) > 0 || self.descendants(id).any(|d| self.is_tag(d, "img"))
    }

    /// Gets the page title.
    ///
    /// Uses the `<title>` element, falling back to the first `<h1>`.
    /// Whitespace is collapsed and the result trimmed.
    pub fn title(&self) -> Option<String> {
        ["title", "h1"]
            .iter()
            .filter_map(|tag| self.first_by_tag(self.root(), tag))
            .map(|id| collapse_whitespace(&self.text_content(id)))
            .find(|title| !title.is_empty())
    }

    /// Ids and classes found on `<div>` elements, for debug listings.
    pub fn div_attributes(&self) -> (Vec<String>, Vec<String>) {
        let mut classes = Vec::new();
        let mut ids = Vec::new();
        for div in self.elements_by_tag(self.root(), "div") {
            if let Some(el) = self.element(div) {
                classes.extend(el.classes().map(str::to_string));
                if let Some(id) = el.id() {
                    ids.push(id.to_string());
                }
            }
        }
        (classes, ids)
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: None, children: Vec::new(), data: NodeData::Text(text.to_string()) });
        id
    }

    /// Removes `id` and its subtree from the tree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Replaces `id` with its own children.
    pub fn unwrap(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        self.replace_with(id, children);
    }

    /// Replaces `id` with a single text node holding `text`.
    pub fn replace_with_text(&mut self, id: NodeId, text: &str) -> NodeId {
        let new = self.create_text(text);
        self.replace_with(id, vec![new]);
        new
    }

    fn replace_with(&mut self, id: NodeId, replacements: Vec<NodeId>) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        for r in &replacements {
            self.nodes[r.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(pos) = siblings.iter().position(|c| *c == id) {
            siblings.splice(pos..=pos, replacements);
        }
    }

    /// Sets the text of a text node.
    pub fn set_text(&mut self, id: NodeId, text: String) {
        if let NodeData::Text(current) = &mut self.nodes[id.0].data {
            *current = text;
        }
    }

    /// Merges adjacent text children of `id` into one node.
    pub fn merge_adjacent_text(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            let prev_text = kept.last().and_then(|p| self.text(*p)).map(str::to_string);
            match (prev_text, self.text(child).map(str::to_string)) {
                (Some(prev), Some(text)) => {
                    let last = kept[kept.len() - 1];
                    self.set_text(last, prev + &text);
                    self.nodes[child.0].parent = None;
                }
                _ => kept.push(child),
            }
        }

        self.nodes[id.0].children = kept;
    }

    /// Serializes the subtree rooted at `id` back to HTML.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_html(*child, out);
                }
            }
            NodeData::Doctype => out.push_str("<!DOCTYPE html>"),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => out.push_str(&escape_html(text, false)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in &el.attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_html(value, true)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.name.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", el.name));
            }
        }
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

fn convert_node(node: &scraper::Node) -> NodeData {
    match node {
        scraper::Node::Document | scraper::Node::Fragment => NodeData::Document,
        scraper::Node::Doctype(_) => NodeData::Doctype,
        scraper::Node::Comment(comment) => NodeData::Comment(String::from(&**comment)),
        scraper::Node::Text(text) => NodeData::Text(String::from(&**text)),
        scraper::Node::Element(el) => NodeData::Element(ElementData {
            name: el.name().to_ascii_lowercase(),
            attrs: el.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }),
        scraper::Node::ProcessingInstruction(_) => NodeData::Comment(String::new()),
    }
}

/// Collapses every whitespace run to a single space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_html(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes raw HTML bytes to text.
///
/// The declared label (usually the `charset` of a `Content-Type` header)
/// wins, then a `<meta charset>` in the first 1024 bytes, then UTF-8. A byte
/// order mark overrides all of them. Malformed sequences become U+FFFD.
pub fn decode_html(raw: &[u8], declared_encoding: Option<&str>) -> String {
    let declared = declared_encoding.and_then(|label| {
        let encoding = Encoding::for_label(label.trim().as_bytes());
        if encoding.is_none() {
            tracing::warn!(encoding = label, "unknown declared encoding, decoding as UTF-8");
        }
        encoding
    });

    let encoding = declared.or_else(|| sniff_meta_charset(raw)).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(raw);
    if had_errors {
        tracing::debug!(encoding = used.name(), "replaced malformed byte sequences");
    }
    text.into_owned()
}

static META_CHARSET: LazyLock<bytes::Regex> = LazyLock::new(|| {
    bytes::Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

fn sniff_meta_charset(raw: &[u8]) -> Option<&'static Encoding> {
    let head = &raw[..raw.len().min(1024)];
    let label = META_CHARSET.captures(head)?.get(1)?;
    let encoding = Encoding::for_label(label.as_bytes())?;
    // a document that could declare itself in ASCII is not UTF-16
    if encoding == UTF_16LE || encoding == UTF_16BE { Some(UTF_8) } else { Some(encoding) }
}
