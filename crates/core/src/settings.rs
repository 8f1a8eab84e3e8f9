//! Settings files.
//!
//! Every command line option can also come from a YAML or JSON file. Values
//! are layered: built-in defaults, then the file, then explicit flags. The
//! CLI builds one [`Settings`] from its flags and merges it over the file
//! with [`Settings::merge`].
//!
//! ```yaml
//! site: https://example.com/docs/
//! root_url: https://example.com/docs
//! content: [docs-body]
//! exclude_pages: ["terms*", "privacy*"]
//! exclude_selectors: [".ad"]
//! extra_heading_space: "1,2"
//! no_images: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ExtractionConfig, HeadingLevels};
#[cfg(feature = "fetch")]
use crate::fetch::FetchConfig;
use crate::naming::OutputNaming;
use crate::{MdScraperError, Result};

/// Options shared by the settings file and the command line.
///
/// Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_links: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepend_source_link: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_heading: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_pages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_selectors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_heading_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<u8>,
}

impl Settings {
    /// `<config dir>/mdscraper/settings.yaml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mdscraper").join("settings.yaml"))
    }

    /// Loads settings from `path`.
    ///
    /// Files ending in `.json` are read as JSON, anything else as YAML.
    ///
    /// # Errors
    ///
    /// [`MdScraperError::FileNotFound`] when the file is missing and
    /// [`MdScraperError::Settings`] when it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MdScraperError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let settings = if is_json { Self::from_json(&content)? } else { Self::from_yaml(&content)? };
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| MdScraperError::Settings(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| MdScraperError::Settings(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| MdScraperError::Settings(e.to_string()))
    }

    /// Writes these settings to `path` as YAML, creating parent directories.
    pub fn save_yaml(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Layers `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            url: overrides.url.or(self.url),
            file: overrides.file.or(self.file),
            site: overrides.site.or(self.site),
            output: overrides.output.or(self.output),
            outdir: overrides.outdir.or(self.outdir),
            root_url: overrides.root_url.or(self.root_url),
            content: overrides.content.or(self.content),
            content_type: overrides.content_type.or(self.content_type),
            no_images: overrides.no_images.or(self.no_images),
            no_links: overrides.no_links.or(self.no_links),
            prepend_source_link: overrides.prepend_source_link.or(self.prepend_source_link),
            title_heading: overrides.title_heading.or(self.title_heading),
            exclude_pages: overrides.exclude_pages.or(self.exclude_pages),
            exclude_selectors: overrides.exclude_selectors.or(self.exclude_selectors),
            extra_heading_space: overrides.extra_heading_space.or(self.extra_heading_space),
            jobs: overrides.jobs.or(self.jobs),
            timeout: overrides.timeout.or(self.timeout),
            user_agent: overrides.user_agent.or(self.user_agent),
            debug: overrides.debug.or(self.debug),
            verbose: overrides.verbose.or(self.verbose),
        }
    }

    /// HTTP options, with unset fields taken from [`FetchConfig::default`].
    #[cfg(feature = "fetch")]
    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    /// Resolves the extraction options into an [`ExtractionConfig`].
    ///
    /// # Errors
    ///
    /// [`MdScraperError::InvalidUrl`] when `root_url` does not parse.
    pub fn extraction_config(&self) -> Result<ExtractionConfig> {
        let root_url = self
            .root_url
            .as_deref()
            .map(|u| Url::parse(u).map_err(|e| MdScraperError::InvalidUrl(format!("{}: {}", u, e))))
            .transpose()?;

        let extra_heading_space = self
            .extra_heading_space
            .as_deref()
            .map(|s| s.parse::<HeadingLevels>().unwrap_or_default())
            .unwrap_or_default();

        let output_naming = self
            .output
            .as_deref()
            .map(|s| s.parse::<OutputNaming>().unwrap_or_default())
            .unwrap_or_default();

        Ok(ExtractionConfig::builder()
            .content_hints(self.content.clone().unwrap_or_default())
            .content_type_hint(self.content_type.clone())
            .exclude_selectors(self.exclude_selectors.clone().unwrap_or_default())
            .no_images(self.no_images.unwrap_or(false))
            .no_links(self.no_links.unwrap_or(false))
            .prepend_source_link(self.prepend_source_link.unwrap_or(false))
            .title_heading(self.title_heading.unwrap_or(false))
            .extra_heading_space(extra_heading_space)
            .root_url(root_url)
            .output_naming(output_naming)
            .debug(self.debug.unwrap_or(false))
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            "site: https://example.com/\nexclude_pages: ['terms*']\nno_images: true\nextra_heading_space: '2'\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.site.as_deref(), Some("https://example.com/"));
        assert_eq!(settings.exclude_pages, Some(vec!["terms*".to_string()]));
        assert_eq!(settings.no_images, Some(true));
        assert_eq!(settings.no_links, None);
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"url": "https://example.com/a", "content": ["docs"], "jobs": 4}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.url.as_deref(), Some("https://example.com/a"));
        assert_eq!(settings.content, Some(vec!["docs".to_string()]));
        assert_eq!(settings.jobs, Some(4));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Settings::load(Path::new("/nonexistent/settings.yaml"));
        assert!(matches!(result, Err(MdScraperError::FileNotFound(_))));
    }

    #[test]
    fn test_load_invalid() {
        let result = Settings::from_yaml("no_images: [not, a, bool]");
        assert!(matches!(result, Err(MdScraperError::Settings(_))));
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_flags_override_file() {
        let file = Settings {
            output: Some("%URL".to_string()),
            no_links: Some(true),
            exclude_selectors: Some(vec![".ad".to_string()]),
            ..Default::default()
        };
        let flags = Settings { no_links: Some(false), url: Some("https://example.com".to_string()), ..Default::default() };

        let merged = file.merge(flags);
        assert_eq!(merged.no_links, Some(false));
        assert_eq!(merged.output.as_deref(), Some("%URL"));
        assert_eq!(merged.exclude_selectors, Some(vec![".ad".to_string()]));
        assert_eq!(merged.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    #[cfg(feature = "fetch")]
    fn test_user_agent_from_file_and_flags() {
        let file = Settings::from_yaml("user_agent: docs-mirror/1.0\ntimeout: 5\n").unwrap();
        assert_eq!(file.user_agent.as_deref(), Some("docs-mirror/1.0"));

        let config = file.fetch_config();
        assert_eq!(config.user_agent, "docs-mirror/1.0");
        assert_eq!(config.timeout, 5);

        let flags = Settings { user_agent: Some("override/2.0".to_string()), ..Default::default() };
        let merged = file.merge(flags);
        assert_eq!(merged.fetch_config().user_agent, "override/2.0");
        assert!(merged.to_yaml().unwrap().contains("user_agent: override/2.0"));

        assert_eq!(Settings::default().fetch_config().user_agent, FetchConfig::default().user_agent);
    }

    #[test]
    fn test_extraction_config() {
        let settings = Settings {
            content: Some(vec!["docs".to_string()]),
            root_url: Some("https://example.com/docs".to_string()),
            extra_heading_space: Some("1,3".to_string()),
            output: Some("%URL".to_string()),
            no_images: Some(true),
            ..Default::default()
        };
        let config = settings.extraction_config().unwrap();

        assert_eq!(config.content_hints, vec!["docs".to_string()]);
        assert_eq!(config.root_url.unwrap().as_str(), "https://example.com/docs");
        assert!(config.extra_heading_space.contains(3));
        assert!(!config.extra_heading_space.contains(2));
        assert_eq!(config.output_naming, OutputNaming::Url);
        assert!(config.no_images);
        assert!(!config.no_links);
    }

    #[test]
    fn test_invalid_root_url() {
        let settings = Settings { root_url: Some("not a url".to_string()), ..Default::default() };
        assert!(matches!(settings.extraction_config(), Err(MdScraperError::InvalidUrl(_))));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("saved.yaml");
        let settings = Settings {
            site: Some("https://example.com/".to_string()),
            exclude_pages: Some(vec!["terms*".to_string()]),
            verbose: Some(1),
            ..Default::default()
        };

        settings.save_yaml(&path).unwrap();
        let saved = fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("url:"));
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }
}
