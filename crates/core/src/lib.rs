pub mod clean;
pub mod config;
pub mod discover;
pub mod dom;
pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod locate;
pub mod naming;
pub mod pipeline;
pub mod preprocess;
pub mod render;
pub mod rewrite;
pub mod settings;

pub use config::{DEFAULT_CONTENT_NAMES, ExtractionConfig, ExtractionConfigBuilder, HeadingLevels};
pub use discover::{ExcludePatterns, SiteLinkSet, discover};
pub use dom::{Document, NodeId, decode_html};
pub use error::{MdScraperError, Result};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, FetchedPage, HttpClient, build_client, fetch_file, fetch_stdin, fetch_url, fetch_with_client};
pub use locate::{LocateMethod, LocatedContent, locate};
pub use naming::{OutputNaming, derive_filename, relative_markdown_path, slugify};
pub use pipeline::{MarkdownDocument, Pipeline};
pub use render::{render, render_document};
pub use rewrite::{LinkWarning, rewrite_links};
pub use settings::Settings;
