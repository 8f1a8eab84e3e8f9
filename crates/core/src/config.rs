//! Extraction configuration.
//!
//! [`ExtractionConfig`] is built once per run, usually from merged CLI flags
//! and settings-file values, and is read-only afterwards. Every pipeline
//! stage takes it by reference.
//!
//! # Example
//!
//! ```rust
//! use mdscraper_core::{ExtractionConfig, HeadingLevels};
//!
//! let config = ExtractionConfig::builder()
//!     .content_hints(["docs-body"])
//!     .exclude_selectors([".ad", "#comments"])
//!     .no_images(true)
//!     .extra_heading_space("1,2".parse::<HeadingLevels>().unwrap())
//!     .build();
//! assert!(config.extra_heading_space.contains(2));
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::naming::OutputNaming;

/// Built-in class/id names that usually wrap the main content.
pub const DEFAULT_CONTENT_NAMES: &[&str] = &[
    "article_content",
    "content",
    "article-content",
    "article",
    "article-body",
    "main-content",
    "main",
    "post-content",
    "post",
    "entry-content",
    "blog-content",
    "body-content",
];

/// Set of heading levels (1–6) that receive an extra blank line before them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingLevels(u8);

impl HeadingLevels {
    const ALL_BITS: u8 = 0b0011_1111;

    /// No heading gets extra space.
    pub fn none() -> Self {
        Self(0)
    }

    /// Every heading level gets extra space.
    pub fn all() -> Self {
        Self(Self::ALL_BITS)
    }

    /// Builds a set from explicit levels; values outside 1–6 are ignored.
    pub fn from_levels(levels: impl IntoIterator<Item = u8>) -> Self {
        let bits = levels
            .into_iter()
            .filter(|l| (1..=6).contains(l))
            .fold(0u8, |acc, l| acc | (1 << (l - 1)));
        Self(bits)
    }

    pub fn contains(&self, level: u8) -> bool {
        (1..=6).contains(&level) && self.0 & (1 << (level - 1)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Parses `"all"` or a comma separated list such as `"1,2,3"`.
///
/// An entry that is not a number selects every level; an empty string
/// selects none.
impl FromStr for HeadingLevels {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }

        let mut levels = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.parse::<u8>() {
                Ok(level) => levels.push(level),
                Err(_) => return Ok(Self::all()),
            }
        }
        Ok(Self::from_levels(levels))
    }
}

impl fmt::Display for HeadingLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::all() {
            return f.write_str("all");
        }
        let levels: Vec<String> = (1..=6).filter(|l| self.contains(*l)).map(|l| l.to_string()).collect();
        f.write_str(&levels.join(","))
    }
}

/// Configuration for locating, cleaning and rendering page content.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// User supplied tag names, class/id names or CSS selectors for the
    /// content container, tried before anything else and in order.
    pub content_hints: Vec<String>,
    /// Built-in class/id names tried after semantic tags.
    pub default_content_names: Vec<String>,
    /// Tag name (e.g. `"table"`) searched first when matching hints.
    pub content_type_hint: Option<String>,
    /// CSS selectors removed from the content.
    pub exclude_selectors: Vec<String>,
    /// Remove every image.
    pub no_images: bool,
    /// Replace every link by its text.
    pub no_links: bool,
    /// Heading levels that get an additional blank line before them.
    pub extra_heading_space: HeadingLevels,
    /// Prepend `Source: <url>` to the output.
    pub prepend_source_link: bool,
    /// Prepend the page title as an H1 unless the content already starts with it.
    pub title_heading: bool,
    /// Root URL for rewriting in-site links to relative Markdown files.
    pub root_url: Option<Url>,
    /// How output filenames are derived.
    pub output_naming: OutputNaming,
    /// Minimum text length for id/class signature matches (default: 25).
    pub min_content_chars: usize,
    /// Record locator and pre-clean diagnostics.
    pub debug: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_hints: Vec::new(),
            default_content_names: DEFAULT_CONTENT_NAMES.iter().map(|s| s.to_string()).collect(),
            content_type_hint: None,
            exclude_selectors: Vec::new(),
            no_images: false,
            no_links: false,
            extra_heading_space: HeadingLevels::none(),
            prepend_source_link: false,
            title_heading: false,
            root_url: None,
            output_naming: OutputNaming::Title,
            min_content_chars: 25,
            debug: false,
        }
    }
}

impl ExtractionConfig {
    /// Creates a new builder for ExtractionConfig.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::new()
    }
}

/// Builder for ExtractionConfig.
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractionConfig::default() }
    }

    pub fn content_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.content_hints = hints.into_iter().map(Into::into).collect();
        self
    }

    pub fn content_type_hint(mut self, hint: Option<String>) -> Self {
        self.config.content_type_hint = hint.map(|h| h.to_ascii_lowercase());
        self
    }

    pub fn exclude_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.exclude_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn no_images(mut self, value: bool) -> Self {
        self.config.no_images = value;
        self
    }

    pub fn no_links(mut self, value: bool) -> Self {
        self.config.no_links = value;
        self
    }

    pub fn extra_heading_space(mut self, levels: HeadingLevels) -> Self {
        self.config.extra_heading_space = levels;
        self
    }

    pub fn prepend_source_link(mut self, value: bool) -> Self {
        self.config.prepend_source_link = value;
        self
    }

    pub fn title_heading(mut self, value: bool) -> Self {
        self.config.title_heading = value;
        self
    }

    pub fn root_url(mut self, url: Option<Url>) -> Self {
        self.config.root_url = url;
        self
    }

    pub fn output_naming(mut self, naming: OutputNaming) -> Self {
        self.config.output_naming = naming;
        self
    }

    pub fn min_content_chars(mut self, value: usize) -> Self {
        self.config.min_content_chars = value;
        self
    }

    pub fn debug(mut self, value: bool) -> Self {
        self.config.debug = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractionConfig {
        self.config
    }
}

impl Default for ExtractionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
