//! Content fetching from URLs, files, and stdin.
//!
//! This module provides functions for retrieving HTML content from
//! various sources: HTTP/HTTPS URLs, local files, and standard input.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::dom::decode_html;
use crate::{MdScraperError, Result};

/// Client type reused across the requests of a run.
pub type HttpClient = Client;

/// HTTP client configuration for fetching web pages.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: concat!("Mozilla/5.0 (compatible; mdscraper/", env!("CARGO_PKG_VERSION"), ")").to_string(),
        }
    }
}

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Undecoded body.
    pub body: Vec<u8>,
    /// URL after redirects; relative links resolve against this.
    pub final_url: Url,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

impl FetchedPage {
    /// The `charset` parameter of the `Content-Type` header.
    pub fn charset(&self) -> Option<&str> {
        self.content_type.as_deref()?.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(['"', '\'']))
        })
    }

    /// The body decoded with [`decode_html`] and the header charset.
    pub fn text(&self) -> String {
        decode_html(&self.body, self.charset())
    }
}

/// Builds the HTTP client shared by every request of a run.
pub fn build_client(config: &FetchConfig) -> Result<HttpClient> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .user_agent(&config.user_agent)
        .build()
        .map_err(MdScraperError::Http)
}

/// Fetches HTML content from a URL.
///
/// Follows redirects and keeps the body undecoded; see
/// [`FetchedPage::text`]. Non-success statuses are errors.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<FetchedPage> {
    let client = build_client(config)?;
    fetch_with_client(&client, url, config.timeout).await
}

/// Like [`fetch_url`], reusing an existing client.
pub async fn fetch_with_client(client: &HttpClient, url: &str, timeout: u64) -> Result<FetchedPage> {
    let parsed_url = Url::parse(url).map_err(|e| MdScraperError::InvalidUrl(format!("{}: {}", url, e)))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(MdScraperError::InvalidUrl(format!(
            "{}: URL must use http:// or https://",
            url
        )));
    }

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() { MdScraperError::Timeout { timeout } } else { MdScraperError::Http(e) }
    };

    let response = client
        .get(parsed_url)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(map_err)?
        .error_for_status()
        .map_err(map_err)?;

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.map_err(map_err)?.to_vec();

    tracing::debug!(url = %final_url, bytes = body.len(), content_type = ?content_type, "fetched page");
    Ok(FetchedPage { body, final_url, content_type })
}

/// Reads undecoded HTML from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<Vec<u8>> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(MdScraperError::FileNotFound(path_buf))
    } else {
        Ok(fs::read(&path_buf)?)
    }
}

/// Reads undecoded HTML from standard input until EOF.
pub fn fetch_stdin() -> Result<Vec<u8>> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("mdscraper"));
    }

    #[test]
    fn test_fetch_url_invalid() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_url("not-a-url", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(MdScraperError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_url_rejects_other_schemes() {
        let config = FetchConfig::default();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(fetch_url("ftp://example.com/file", &config))
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(MdScraperError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(MdScraperError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>hi</p>").unwrap();

        let html = fetch_file(path.to_str().unwrap()).unwrap();
        assert_eq!(html, b"<p>hi</p>");
    }

    fn page(content_type: Option<&str>, body: &[u8]) -> FetchedPage {
        FetchedPage {
            body: body.to_vec(),
            final_url: Url::parse("https://example.com/").unwrap(),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(page(Some("text/html; charset=ISO-8859-1"), b"").charset(), Some("ISO-8859-1"));
        assert_eq!(page(Some("text/html;Charset=\"utf-8\""), b"").charset(), Some("utf-8"));
        assert_eq!(page(Some("text/html"), b"").charset(), None);
        assert_eq!(page(None, b"").charset(), None);
    }

    #[test]
    fn test_text_uses_header_charset() {
        let latin1 = page(Some("text/html; charset=windows-1252"), b"<p>caf\xe9 \x80</p>");
        assert_eq!(latin1.text(), "<p>caf\u{e9} \u{20ac}</p>");

        let sniffed = page(Some("text/html"), b"<meta charset=\"iso-8859-1\"><p>caf\xe9</p>");
        assert!(sniffed.text().ends_with("<p>caf\u{e9}</p>"));
    }
}
