//! Markdown rendering of a cleaned content subtree.
//!
//! [`convert_nodes_to_markdown`] dispatches on tag name and produces a list
//! of blocks (paragraphs, headings, lists, tables, quotes, code); phrasing
//! content goes through [`convert_children_to_string`]. Unknown tags degrade
//! to their text content. Blocks are joined with one blank line; headings
//! whose level is listed in [`ExtractionConfig::extra_heading_space`] get one
//! more.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::ExtractionConfig;
use crate::dom::{Document, NodeData, NodeId, collapse_whitespace};

/// Elements whose children are converted as blocks of their own.
const CONTAINER_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "body",
    "caption",
    "center",
    "dd",
    "details",
    "dialog",
    "div",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "header",
    "hgroup",
    "html",
    "legend",
    "li",
    "main",
    "nav",
    "section",
    "summary",
];

/// Elements with no renderable content.
const SKIP_TAGS: &[&str] = &[
    "head", "title", "script", "style", "noscript", "template", "meta", "link", "svg", "iframe", "object", "embed",
    "canvas",
];

static BLANK_LINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank line pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    Heading(u8),
    Code,
}

#[derive(Debug, Clone)]
struct MarkdownBlock {
    text: String,
    kind: BlockKind,
}

impl MarkdownBlock {
    fn text(text: String) -> Self {
        Self { text, kind: BlockKind::Text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Center,
    Right,
    Default,
}

impl Alignment {
    fn separator(self) -> &'static str {
        match self {
            Alignment::Left => ":---",
            Alignment::Center => ":---:",
            Alignment::Right => "---:",
            Alignment::Default => "---",
        }
    }
}

/// Renders the subtree rooted at `root` as Markdown.
///
/// When `config.prepend_source_link` is set and `source_url` is given, the
/// output starts with a `Source: <url>` line and a blank line.
pub fn render(doc: &Document, root: NodeId, config: &ExtractionConfig, source_url: Option<&Url>) -> String {
    render_document(doc, root, config, source_url, None)
}

/// Like [`render`], additionally leading with `# <title>` when `title` is
/// given and the content does not already open with that heading.
pub fn render_document(
    doc: &Document, root: NodeId, config: &ExtractionConfig, source_url: Option<&Url>, title: Option<&str>,
) -> String {
    let mut blocks = convert_nodes_to_markdown(doc, &[root]);

    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        let heading = format!("# {}", title);
        if blocks.first().is_none_or(|b| b.text != heading) {
            blocks.insert(0, MarkdownBlock { text: heading, kind: BlockKind::Heading(1) });
        }
    }

    if config.prepend_source_link
        && let Some(url) = source_url
    {
        blocks.insert(0, MarkdownBlock::text(format!("Source: {}", url)));
    }

    join_blocks(&blocks, config).trim().to_string()
}

fn join_blocks(blocks: &[MarkdownBlock], config: &ExtractionConfig) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            match block.kind {
                BlockKind::Heading(level) if config.extra_heading_space.contains(level) => out.push_str("\n\n\n"),
                _ => out.push_str("\n\n"),
            }
        }
        match block.kind {
            BlockKind::Code => out.push_str(&block.text),
            _ => out.push_str(&BLANK_LINE_RUNS.replace_all(block.text.trim(), "\n\n")),
        }
    }
    out
}

fn convert_nodes_to_markdown(doc: &Document, nodes: &[NodeId]) -> Vec<MarkdownBlock> {
    let mut blocks = Vec::new();
    let mut inline = String::new();

    for &id in nodes {
        let el = match &doc.node(id).data {
            NodeData::Text(text) => {
                inline.push_str(&escape_text(&collapse_inline(text)));
                continue;
            }
            NodeData::Document => {
                flush_inline(&mut inline, &mut blocks);
                blocks.extend(convert_nodes_to_markdown(doc, doc.children(id)));
                continue;
            }
            NodeData::Element(el) => el,
            _ => continue,
        };

        let tag = el.name.as_str();
        let block = match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => handle_heading_element(doc, id, tag.as_bytes()[1] - b'0'),
            "p" => handle_paragraph_element(doc, id),
            "hr" => Some(MarkdownBlock::text("---".to_string())),
            "ul" | "ol" => Some(MarkdownBlock::text(convert_html_list_to_markdown(doc, id, tag == "ol"))),
            "blockquote" => Some(MarkdownBlock::text(handle_blockquote_element(doc, id))),
            "pre" => Some(handle_pre_element(doc, id)),
            "table" => Some(MarkdownBlock::text(convert_html_table_to_markdown(doc, id))),
            "dl" => Some(MarkdownBlock::text(handle_dl_element(doc, id))),
            "br" => {
                inline.push('\n');
                continue;
            }
            _ if SKIP_TAGS.contains(&tag) => continue,
            _ if CONTAINER_TAGS.contains(&tag) => {
                flush_inline(&mut inline, &mut blocks);
                blocks.extend(convert_nodes_to_markdown(doc, doc.children(id)));
                continue;
            }
            _ => {
                inline.push_str(&convert_children_to_string(doc, &[id]));
                continue;
            }
        };

        flush_inline(&mut inline, &mut blocks);
        if let Some(block) = block.filter(|b| !b.text.trim().is_empty()) {
            blocks.push(block);
        }
    }

    flush_inline(&mut inline, &mut blocks);
    blocks
}

fn flush_inline(inline: &mut String, blocks: &mut Vec<MarkdownBlock>) {
    let paragraph = tidy_inline(inline);
    inline.clear();
    if !paragraph.is_empty() {
        blocks.push(MarkdownBlock::text(paragraph));
    }
}

/// Converts nested blocks and joins them with `separator`.
fn blocks_to_string(doc: &Document, id: NodeId, separator: &str) -> String {
    convert_nodes_to_markdown(doc, doc.children(id))
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

fn handle_heading_element(doc: &Document, id: NodeId, level: u8) -> Option<MarkdownBlock> {
    let text = collapse_whitespace(&convert_children_to_string(doc, doc.children(id)));
    if text.is_empty() {
        return None;
    }
    Some(MarkdownBlock { text: format!("{} {}", "#".repeat(level as usize), text), kind: BlockKind::Heading(level) })
}

fn handle_paragraph_element(doc: &Document, id: NodeId) -> Option<MarkdownBlock> {
    let text = tidy_inline(&convert_children_to_string(doc, doc.children(id)));
    (!text.is_empty()).then(|| MarkdownBlock::text(text))
}

fn handle_blockquote_element(doc: &Document, id: NodeId) -> String {
    blocks_to_string(doc, id, "\n\n")
        .lines()
        .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
        .collect::<Vec<_>>()
        .join("\n")
}

fn handle_pre_element(doc: &Document, id: NodeId) -> MarkdownBlock {
    let text = doc.text_content(id);
    let body = text.trim_matches('\n').trim_end();

    let language = std::iter::once(id)
        .chain(doc.element_children(id))
        .filter_map(|node| doc.element(node))
        .flat_map(|el| el.classes().map(str::to_string).collect::<Vec<_>>())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
        .unwrap_or_default();

    let fence = if body.contains("```") { "~~~" } else { "```" };
    MarkdownBlock { text: format!("{}{}\n{}\n{}", fence, language, body, fence), kind: BlockKind::Code }
}

/// `<dt>` terms in bold, `<dd>` descriptions indented below them.
fn handle_dl_element(doc: &Document, id: NodeId) -> String {
    let mut parts = Vec::new();
    for child in doc.element_children(id) {
        match doc.tag_name(child).unwrap_or_default() {
            "dt" => {
                let term = collapse_whitespace(&convert_children_to_string(doc, doc.children(child)));
                if !term.is_empty() {
                    parts.push(format!("**{}**", term));
                }
            }
            "dd" => {
                let description = blocks_to_string(doc, child, "\n");
                if !description.is_empty() {
                    parts.push(description.lines().map(|line| indent(line, "  ")).collect::<Vec<_>>().join("\n"));
                }
            }
            tag if SKIP_TAGS.contains(&tag) => {}
            _ => {
                let other = blocks_to_string(doc, child, "\n\n");
                if !other.is_empty() {
                    parts.push(other);
                }
            }
        }
    }
    parts.join("\n")
}

fn convert_html_list_to_markdown(doc: &Document, id: NodeId, ordered: bool) -> String {
    let mut number: u64 = if ordered {
        doc.attr(id, "start")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1)
    } else {
        1
    };

    let mut lines: Vec<String> = Vec::new();
    for child in doc.element_children(id) {
        let tag = doc.tag_name(child).unwrap_or_default();
        if SKIP_TAGS.contains(&tag) {
            continue;
        }

        // a list nested directly in a list belongs to the previous item
        if matches!(tag, "ul" | "ol") {
            let nested = convert_html_list_to_markdown(doc, child, tag == "ol");
            lines.extend(nested.lines().map(|line| indent(line, "  ")));
            continue;
        }

        let marker = if ordered { format!("{}. ", number) } else { "- ".to_string() };
        number = number.saturating_add(1);

        let body = blocks_to_string(doc, child, "\n");
        if body.is_empty() {
            lines.push(marker.trim_end().to_string());
            continue;
        }

        let padding = " ".repeat(marker.len());
        for (i, line) in body.lines().enumerate() {
            if i == 0 {
                lines.push(format!("{}{}", marker, line));
            } else {
                lines.push(indent(line, &padding));
            }
        }
    }

    lines.join("\n")
}

fn convert_html_table_to_markdown(doc: &Document, id: NodeId) -> String {
    let mut caption = None;
    let mut head_rows = Vec::new();
    let mut body_rows = Vec::new();

    for child in doc.element_children(id) {
        match doc.tag_name(child).unwrap_or_default() {
            "caption" => caption = Some(flatten_cell(doc, child)),
            "thead" => head_rows.extend(rows_of(doc, child)),
            "tbody" | "tfoot" => body_rows.extend(rows_of(doc, child)),
            "tr" => body_rows.push(child),
            _ => {}
        }
    }

    let (header, rest): (Option<NodeId>, Vec<NodeId>) = if head_rows.is_empty() {
        (body_rows.first().copied(), body_rows.iter().skip(1).copied().collect())
    } else {
        (Some(head_rows[0]), head_rows[1..].iter().chain(body_rows.iter()).copied().collect())
    };
    let Some(header) = header else {
        return String::new();
    };

    let header_cells = cells_of(doc, header);
    let mut alignments: Vec<Alignment> = header_cells.iter().map(|(_, align)| *align).collect();
    let mut rows: Vec<Vec<String>> = std::iter::once(header_cells)
        .chain(rest.into_iter().map(|tr| cells_of(doc, tr)))
        .map(|row| row.into_iter().map(|(text, _)| text).collect())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }
    for row in &mut rows {
        row.resize(width, String::new());
    }
    alignments.resize(width, Alignment::Default);

    let separator: Vec<String> = alignments.iter().map(|a| a.separator().to_string()).collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(table_line(&rows[0]));
    lines.push(table_line(&separator));
    lines.extend(rows[1..].iter().map(|row| table_line(row)));

    let table = lines.join("\n");
    match caption.filter(|c| !c.is_empty()) {
        Some(caption) => format!("{}\n\n{}", caption, table),
        None => table,
    }
}

fn rows_of(doc: &Document, section: NodeId) -> Vec<NodeId> {
    doc.element_children(section)
        .filter(|c| doc.is_tag(*c, "tr"))
        .collect()
}

/// Cell texts of a row, with `colspan` cells padded by empty ones.
fn cells_of(doc: &Document, row: NodeId) -> Vec<(String, Alignment)> {
    let mut cells = Vec::new();
    for cell in doc.element_children(row) {
        if !matches!(doc.tag_name(cell), Some("td" | "th")) {
            continue;
        }
        let span: usize = doc
            .attr(cell, "colspan")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1)
            .clamp(1, 32);
        let align = get_cell_alignment(doc, cell);
        cells.push((escape_table_cell_content(&flatten_cell(doc, cell)), align));
        cells.extend(std::iter::repeat_n((String::new(), align), span - 1));
    }
    cells
}

/// Alignment from `style="text-align: …"`, falling back to `align`.
fn get_cell_alignment(doc: &Document, cell: NodeId) -> Alignment {
    let from_style = doc.attr(cell, "style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            (name.trim().eq_ignore_ascii_case("text-align")).then(|| value.trim().to_ascii_lowercase())
        })
    });

    match from_style
        .or_else(|| doc.attr(cell, "align").map(str::to_ascii_lowercase))
        .as_deref()
    {
        Some("left") => Alignment::Left,
        Some("center") => Alignment::Center,
        Some("right") => Alignment::Right,
        _ => Alignment::Default,
    }
}

/// Renders a cell's content on one line, joining nested blocks with spaces.
fn flatten_cell(doc: &Document, cell: NodeId) -> String {
    collapse_whitespace(&blocks_to_string(doc, cell, " "))
}

fn escape_table_cell_content(content: &str) -> String {
    content.replace('|', "\\|")
}

fn table_line(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Inline Markdown for a run of phrasing content.
fn convert_children_to_string(doc: &Document, nodes: &[NodeId]) -> String {
    let mut parts = String::new();
    for &id in nodes {
        let el = match &doc.node(id).data {
            NodeData::Text(text) => {
                parts.push_str(&escape_text(&collapse_inline(text)));
                continue;
            }
            NodeData::Element(el) => el,
            _ => continue,
        };

        let tag = el.name.as_str();
        let part = match tag {
            "strong" | "b" => wrap_inline("**", &convert_children_to_string(doc, doc.children(id))),
            "em" | "i" => wrap_inline("*", &convert_children_to_string(doc, doc.children(id))),
            "del" | "s" | "strike" => wrap_inline("~~", &convert_children_to_string(doc, doc.children(id))),
            "code" | "kbd" | "samp" | "tt" | "pre" => code_span(&doc.text_content(id)),
            "a" => handle_link_element(doc, id),
            "img" => handle_image_element(doc, id),
            "br" => "\n".to_string(),
            _ if SKIP_TAGS.contains(&tag) => String::new(),
            _ if is_block_level(tag) => format!(" {} ", convert_children_to_string(doc, doc.children(id))),
            _ => convert_children_to_string(doc, doc.children(id)),
        };
        parts.push_str(&part);
    }
    parts
}

fn handle_link_element(doc: &Document, id: NodeId) -> String {
    let inner = convert_children_to_string(doc, doc.children(id));
    let Some(href) = doc.attr(id, "href").map(str::trim).filter(|h| !h.is_empty()) else {
        return inner;
    };

    let label = collapse_whitespace(&inner);
    if label.is_empty() {
        return String::new();
    }

    keep_edges(&inner, format!("[{}]({}{})", label, process_url_for_markdown(href), title_part(doc, id)))
}

fn handle_image_element(doc: &Document, id: NodeId) -> String {
    let Some(src) = doc.attr(id, "src").map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let alt = collapse_whitespace(doc.attr(id, "alt").unwrap_or_default())
        .replace('[', "\\[")
        .replace(']', "\\]");

    format!("![{}]({}{})", alt, process_url_for_markdown(src), title_part(doc, id))
}

fn title_part(doc: &Document, id: NodeId) -> String {
    doc.attr(id, "title")
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
        .unwrap_or_default()
}

/// Link destinations with spaces or parentheses go in angle brackets.
fn process_url_for_markdown(url: &str) -> String {
    let processed = url.replace(' ', "%20");
    if processed.contains(['(', ')', '<', '>']) || url.contains(char::is_whitespace) {
        format!("<{}>", processed.replace('<', "%3C").replace('>', "%3E"))
    } else {
        processed
    }
}

/// Block-level content gets spacing when flattened into a line.
fn is_block_level(tag: &str) -> bool {
    tag == "p"
        || CONTAINER_TAGS.contains(&tag)
        || matches!(
            tag,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "dl" | "table" | "tr" | "td" | "th" | "blockquote" | "hr"
        )
}

fn indent(line: &str, padding: &str) -> String {
    if line.is_empty() { String::new() } else { format!("{}{}", padding, line) }
}

/// Collapses every whitespace run to one space, keeping edge spaces.
fn collapse_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('*', "\\*").replace('_', "\\_")
}

/// Turns buffered inline output into paragraph text; `\n` marks a hard break.
fn tidy_inline(inline: &str) -> String {
    inline
        .split('\n')
        .map(|line| line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("  \n")
}

/// Wraps `inner` in `marker`, moving edge whitespace outside the markers.
fn wrap_inline(marker: &str, inner: &str) -> String {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return inner.to_string();
    }
    keep_edges(inner, format!("{}{}{}", marker, trimmed, marker))
}

fn keep_edges(original: &str, rendered: String) -> String {
    let lead = if original.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if original.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{}{}{}", lead, rendered, trail)
}

fn code_span(text: &str) -> String {
    let code = text.replace('\n', " ");
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }
    if code.contains('`') { format!("`` {} ``", code) } else { format!("`{}`", code) }
}
