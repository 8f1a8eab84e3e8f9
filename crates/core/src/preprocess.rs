//! Streaming fixes applied to raw HTML before it is parsed.

use url::Url;

/// Resolves relative link and image URLs against `base_url`.
///
/// Fragment-only hrefs (`#section`) and hrefs that cannot be joined are left
/// as written. On any rewriter failure the input is returned unchanged.
pub fn absolutize_urls(html: &str, base_url: &Url) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href")
                        && !href.starts_with('#')
                        && let Ok(absolute) = base_url.join(href.trim())
                    {
                        el.set_attribute("href", absolute.as_str()).ok();
                    }
                    Ok(())
                }),
                lol_html::element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src")
                        && let Ok(absolute) = base_url.join(src.trim())
                    {
                        el.set_attribute("src", absolute.as_str()).ok();
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize_links_and_images() {
        let base = Url::parse("https://example.com/docs/page.html").unwrap();
        let html = r#"<a href="other.html">o</a><a href="/root">r</a><img src="img/a.png">"#;

        let result = absolutize_urls(html, &base);

        assert!(result.contains(r#"href="https://example.com/docs/other.html""#));
        assert!(result.contains(r#"href="https://example.com/root""#));
        assert!(result.contains(r#"src="https://example.com/docs/img/a.png""#));
    }

    #[test]
    fn test_fragment_links_untouched() {
        let base = Url::parse("https://example.com/docs/page.html").unwrap();
        let result = absolutize_urls(r##"<a href="#intro">i</a>"##, &base);
        assert!(result.contains(r##"href="#intro""##));
    }

    #[test]
    fn test_absolute_links_unchanged() {
        let base = Url::parse("https://example.com/").unwrap();
        let result = absolutize_urls(r#"<a href="https://other.com/x">x</a>"#, &base);
        assert!(result.contains(r#"href="https://other.com/x""#));
    }
}
