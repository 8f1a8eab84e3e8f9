//! Output filename derivation.
//!
//! The same rules name the files a driver writes and the targets the link
//! rewriter points at, so an exported site stays browsable offline.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use url::Url;

/// Extensions dropped from a URL segment before it becomes a filename.
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "shtml", "php", "asp", "aspx", "jsp", "md"];

const FALLBACK_NAME: &str = "untitled";

/// How the output filename of a page is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputNaming {
    /// `%TITLE`: slug of the page title.
    #[default]
    Title,
    /// `%URL`: slug of the last URL path segment.
    Url,
    /// A literal filename.
    Fixed(String),
}

impl FromStr for OutputNaming {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "%TITLE" | "$TITLE" => Self::Title,
            "%URL" | "$URL" => Self::Url,
            other => Self::Fixed(other.to_string()),
        })
    }
}

impl fmt::Display for OutputNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("%TITLE"),
            Self::Url => f.write_str("%URL"),
            Self::Fixed(name) => f.write_str(name),
        }
    }
}

/// Lower-cases `text` and joins its alphanumeric runs with single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// `<slug>.md` for a title, `None` when the title has no usable characters.
pub fn filename_from_title(title: &str) -> Option<String> {
    let slug = slugify(title);
    (!slug.is_empty()).then(|| format!("{}.md", slug))
}

/// `<slug>.md` from the last non-empty path segment of `url`.
///
/// The site root maps to `index.md`.
pub fn filename_from_url(url: &Url) -> String {
    let segment = url.path().split('/').rev().find(|s| !s.is_empty());
    match segment {
        Some(segment) => format!("{}.md", segment_slug(segment)),
        None => "index.md".to_string(),
    }
}

/// Picks the output filename for a page.
///
/// Title naming falls back to the URL and URL naming to the title; with
/// neither available a generic name is used.
pub fn derive_filename(naming: &OutputNaming, title: Option<&str>, url: Option<&Url>) -> String {
    let from_title = || title.and_then(filename_from_title);
    let from_url = || url.map(filename_from_url);

    match naming {
        OutputNaming::Fixed(name) => Some(name.clone()),
        OutputNaming::Title => from_title().or_else(from_url),
        OutputNaming::Url => from_url().or_else(from_title),
    }
    .unwrap_or_else(|| format!("{}.md", FALLBACK_NAME))
}

/// Path of the Markdown file for `target` relative to the export root.
///
/// Returns `None` unless `target` shares scheme and host with `root` and its
/// path lies at or below the root path. Directory segments are kept (as
/// slugs), the final segment loses its page extension, and directory-style
/// URLs map to `index.md`.
pub fn relative_markdown_path(root: &Url, target: &Url) -> Option<String> {
    if root.scheme() != target.scheme() || root.host_str() != target.host_str() {
        return None;
    }

    let root_path = root.path().trim_end_matches('/');
    let target_path = target.path();

    let rest = if target_path == root_path || target_path.strip_suffix('/') == Some(root_path) {
        ""
    } else {
        target_path.strip_prefix(root_path)?.strip_prefix('/')?
    };

    let mut segments: Vec<&str> = rest.split('/').collect();
    let file = segments.pop().filter(|s| !s.is_empty());

    let mut parts: Vec<String> = segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(segment_slug)
        .collect();
    parts.push(format!("{}.md", file.map(segment_slug).unwrap_or_else(|| "index".to_string())));

    Some(parts.join("/"))
}

/// Relative reference from the file `from` to the file `to`, both given as
/// `/`-separated paths under the same export root.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_dirs: Vec<&str> = {
        let mut parts: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
        parts.pop();
        parts
    };
    let to_parts: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_dirs
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count()
        .min(to_parts.len().saturating_sub(1));

    let mut out: Vec<&str> = vec![".."; from_dirs.len() - common];
    out.extend(&to_parts[common..]);
    out.join("/")
}

fn segment_slug(segment: &str) -> String {
    let stem = match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            stem
        }
        _ => segment,
    };

    let slug = slugify(stem);
    if slug.is_empty() { "index".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[rstest]
    #[case("Hello, World!", "hello-world")]
    #[case("  --Rust 2024: What's New?--  ", "rust-2024-what-s-new")]
    #[case("Ünïcode Tïtle", "ünïcode-tïtle")]
    #[case("***", "")]
    fn test_slugify(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn test_output_naming_parse() {
        assert_eq!("%TITLE".parse::<OutputNaming>().unwrap(), OutputNaming::Title);
        assert_eq!("$TITLE".parse::<OutputNaming>().unwrap(), OutputNaming::Title);
        assert_eq!("%URL".parse::<OutputNaming>().unwrap(), OutputNaming::Url);
        assert_eq!(
            "notes.md".parse::<OutputNaming>().unwrap(),
            OutputNaming::Fixed("notes.md".to_string())
        );
    }

    #[rstest]
    #[case("https://example.com/docs/Getting_Started.html", "getting-started.md")]
    #[case("https://example.com/docs/guide/", "guide.md")]
    #[case("https://example.com/", "index.md")]
    #[case("https://example.com/v1.2?x=1", "v1-2.md")]
    fn test_filename_from_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(filename_from_url(&url(input)), expected);
    }

    #[test]
    fn test_derive_filename_fallbacks() {
        let page = url("https://example.com/docs/intro.html");
        assert_eq!(derive_filename(&OutputNaming::Title, Some("My Page"), Some(&page)), "my-page.md");
        assert_eq!(derive_filename(&OutputNaming::Title, Some("!!!"), Some(&page)), "intro.md");
        assert_eq!(derive_filename(&OutputNaming::Url, Some("My Page"), Some(&page)), "intro.md");
        assert_eq!(derive_filename(&OutputNaming::Url, Some("My Page"), None), "my-page.md");
        assert_eq!(derive_filename(&OutputNaming::Title, None, None), "untitled.md");
        assert_eq!(
            derive_filename(&OutputNaming::Fixed("out.md".to_string()), Some("x"), None),
            "out.md"
        );
    }

    #[rstest]
    #[case("https://example.com/docs", "https://example.com/docs/a/b.html", Some("a/b.md"))]
    #[case("https://example.com/docs/", "https://example.com/docs/a/b.html", Some("a/b.md"))]
    #[case("https://example.com/docs", "https://example.com/docs", Some("index.md"))]
    #[case("https://example.com/docs", "https://example.com/docs/", Some("index.md"))]
    #[case("https://example.com/docs", "https://example.com/docs/api/", Some("api/index.md"))]
    #[case("https://example.com/docs", "https://example.com/docsearch/x", None)]
    #[case("https://example.com/docs", "https://example.com/blog/x", None)]
    #[case("https://example.com/docs", "https://other.com/docs/x", None)]
    #[case("https://example.com/docs", "http://example.com/docs/x", None)]
    #[case("https://example.com/", "https://example.com/a.html", Some("a.md"))]
    fn test_relative_markdown_path(#[case] root: &str, #[case] target: &str, #[case] expected: Option<&str>) {
        assert_eq!(relative_markdown_path(&url(root), &url(target)).as_deref(), expected);
    }

    #[rstest]
    #[case("index.md", "a/b.md", "a/b.md")]
    #[case("a/b.md", "a/c.md", "c.md")]
    #[case("a/b.md", "index.md", "../index.md")]
    #[case("a/x/b.md", "a/y/c.md", "../y/c.md")]
    #[case("a/b.md", "a/b.md", "b.md")]
    #[case("a.md", "a/index.md", "a/index.md")]
    fn test_relative_path(#[case] from: &str, #[case] to: &str, #[case] expected: &str) {
        assert_eq!(relative_path(from, to), expected);
    }
}
