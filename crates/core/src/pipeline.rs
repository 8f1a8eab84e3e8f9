//! Single-page conversion entry points.
//!
//! A [`Pipeline`] owns one [`ExtractionConfig`] and turns each page it is
//! given into a [`MarkdownDocument`] by running parse, locate, clean,
//! rewrite and render in that order. Pages share nothing, so one pipeline
//! can be used from many tasks at once.
//!
//! # Example
//!
//! ```rust
//! use mdscraper_core::{ExtractionConfig, Pipeline};
//!
//! let html = "<html><body><nav>Home</nav><main><h1>Title</h1><p>Hello <b>world</b></p></main></body></html>";
//! let doc = Pipeline::new(ExtractionConfig::default()).process(html, None).unwrap();
//! assert_eq!(doc.markdown, "# Title\n\nHello **world**");
//! ```

use url::Url;

use crate::clean::clean;
use crate::config::ExtractionConfig;
use crate::discover::{ExcludePatterns, SiteLinkSet, discover};
use crate::dom::{Document, decode_html};
use crate::locate::{LocateMethod, locate};
use crate::naming::{derive_filename, relative_markdown_path};
use crate::render::render_document;
use crate::rewrite::{LinkWarning, rewrite_links};
use crate::{MdScraperError, Result};

/// The converted page.
#[derive(Debug, Clone)]
pub struct MarkdownDocument {
    /// Rendered Markdown, never empty.
    pub markdown: String,
    /// Page title from `<title>` or the first `<h1>`.
    pub title: Option<String>,
    /// Suggested output filename, `/`-separated when it mirrors a site layout.
    pub filename: String,
    /// The locator rule that picked the content.
    pub method: LocateMethod,
    /// Links left untouched because they could not be parsed.
    pub warnings: Vec<LinkWarning>,
    /// Content subtree before cleaning, recorded in debug mode only.
    pub debug_html: Option<String>,
}

/// Converts HTML pages with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: ExtractionConfig,
}

impl Pipeline {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Converts one page.
    ///
    /// `source_url` is the page's own URL when known; it is used to resolve
    /// relative links and images, for the source-link line, and for
    /// URL-based file naming.
    ///
    /// # Errors
    ///
    /// [`MdScraperError::Parse`] when the input holds no markup and
    /// [`MdScraperError::NoContent`] when no content region is found or the
    /// region renders to nothing.
    pub fn process(&self, html: &str, source_url: Option<&Url>) -> Result<MarkdownDocument> {
        let doc = Document::parse_with_base(html, source_url)?;
        self.convert(doc, source_url)
    }

    /// Like [`Pipeline::process`] for undecoded bytes with an optional
    /// declared charset.
    pub fn process_bytes(
        &self, raw: &[u8], declared_encoding: Option<&str>, source_url: Option<&Url>,
    ) -> Result<MarkdownDocument> {
        self.process(&decode_html(raw, declared_encoding), source_url)
    }

    /// Lists same-site pages linked from a seed page.
    ///
    /// # Errors
    ///
    /// [`MdScraperError::InvalidPattern`] for a bad glob and
    /// [`MdScraperError::Parse`] for an unparseable page.
    pub fn discover_site_links(&self, html: &str, seed: &Url, exclude_patterns: &[String]) -> Result<SiteLinkSet> {
        let exclude = ExcludePatterns::new(exclude_patterns)?;
        let doc = Document::parse(html)?;
        Ok(discover(&doc, seed, &exclude))
    }

    fn convert(&self, mut doc: Document, source_url: Option<&Url>) -> Result<MarkdownDocument> {
        let config = &self.config;
        let title = doc.title();

        if config.debug {
            let (classes, ids) = doc.div_attributes();
            tracing::debug!(?classes, ?ids, "div attributes");
        }

        let content = locate(&doc, config)?;
        let debug_html = config.debug.then(|| doc.outer_html(content.node));
        if let Some(html) = &debug_html {
            tracing::debug!(html = %html, "content before cleaning");
        }

        let root = clean(&mut doc, &content, config);
        let warnings = rewrite_links(&mut doc, root, config.root_url.as_ref(), source_url);

        let heading = if config.title_heading { title.as_deref() } else { None };
        let markdown = render_document(&doc, root, config, source_url, heading);
        if markdown.is_empty() {
            return Err(MdScraperError::NoContent);
        }

        let filename = self.filename(title.as_deref(), source_url);
        Ok(MarkdownDocument { markdown, title, filename, method: content.method, warnings, debug_html })
    }

    /// Root-relative path when the page lies under the root URL, so link
    /// targets and written files agree; otherwise the configured naming.
    fn filename(&self, title: Option<&str>, source_url: Option<&Url>) -> String {
        self.config
            .root_url
            .as_ref()
            .zip(source_url)
            .and_then(|(root, source)| relative_markdown_path(root, source))
            .unwrap_or_else(|| derive_filename(&self.config.output_naming, title, source_url))
    }
}
