//! Error types for mdscraper operations.
//!
//! This module defines the main error type [`MdScraperError`] which represents
//! everything that can make a single page fail: unparseable input, a page
//! with no recognizable main content, fetch failures and bad configuration.
//!
//! Malformed links inside an otherwise healthy page are not errors; the link
//! rewriter reports them as [`crate::rewrite::LinkWarning`] values instead.
//!
//! # Example
//!
//! ```rust
//! use mdscraper_core::{MdScraperError, Result};
//!
//! fn convert(html: &str) -> Result<String> {
//!     if html.trim().is_empty() {
//!         return Err(MdScraperError::Parse("empty document".to_string()));
//!     }
//!     // ... conversion logic
//!     # Ok(String::new())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for content extraction and conversion.
///
/// Every variant is fatal for the page being processed only. Batch drivers
/// are expected to record the failure and continue with the next page.
///
/// # Example
///
/// ```rust
/// use mdscraper_core::{ExtractionConfig, MdScraperError, Pipeline};
///
/// let pipeline = Pipeline::new(ExtractionConfig::default());
/// match pipeline.process("<html><body></body></html>", None) {
///     Ok(doc) => println!("{}", doc.markdown),
///     Err(MdScraperError::NoContent) => println!("nothing worth converting"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum MdScraperError {
    /// HTTP request errors from reqwest.
    ///
    /// Network errors, DNS failures, connection problems and non-success
    /// status codes all land here.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL given by the caller (not one found inside a page)
    /// cannot be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The payload could not be turned into a document.
    ///
    /// Returned for empty input or input that contains no markup at all.
    #[error("Failed to parse HTML: {0}")]
    Parse(String),

    /// No locator rule produced a non-empty content subtree.
    #[error("No main content could be located in the document")]
    NoContent,

    /// A CSS selector from the configuration is invalid.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// An exclude-page glob pattern is invalid.
    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),

    /// Settings file errors.
    ///
    /// Returned when a settings file is neither valid YAML nor valid JSON,
    /// or holds values of the wrong shape.
    #[error("Settings error: {0}")]
    Settings(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read and write errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MdScraperError.
pub type Result<T> = std::result::Result<T, MdScraperError>;
