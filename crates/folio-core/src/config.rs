//! Site configuration management.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    content::Theme,
    error::{CoreError, Result},
    reading::DEFAULT_WORDS_PER_MINUTE,
};

/// Main configuration structure for Folio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Content store layout.
    #[serde(default)]
    pub content: ContentConfig,

    /// RSS feed settings.
    #[serde(default)]
    pub rss: RssConfig,

    /// Extra components available to MDX bodies, keyed by tag name.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentConfig>,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,

    /// Theme used when a page does not ask for one.
    #[serde(default)]
    pub default_theme: Theme,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Root of the content store.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Static assets copied verbatim into the output.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Whether to generate drafts.
    #[serde(default)]
    pub drafts: bool,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,

    /// Reading speed used for reading time estimates.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

/// Content store layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Category directories under the content root, in navigation order.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

/// RSS feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssConfig {
    /// Whether RSS feed is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of items in feed.
    #[serde(default = "default_rss_limit")]
    pub limit: usize,
}

/// A component declared in configuration: renders as a plain element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// HTML element to emit.
    #[serde(default = "default_element")]
    pub element: String,

    /// CSS class added to the element.
    #[serde(default)]
    pub class: Option<String>,
}

// Default value functions
fn default_output_dir() -> String {
    "public".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_words_per_minute() -> u32 {
    DEFAULT_WORDS_PER_MINUTE
}

fn default_categories() -> Vec<String> {
    vec!["posts".to_string(), "sketches".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_rss_limit() -> usize {
    20
}

fn default_element() -> String {
    "div".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            content_dir: default_content_dir(),
            static_dir: default_static_dir(),
            drafts: false,
            syntax_theme: default_syntax_theme(),
            words_per_minute: default_words_per_minute(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: default_rss_limit(),
        }
    }
}

impl Config {
    /// A configuration with defaults for everything but the site identity.
    pub fn new(title: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                title: title.into(),
                base_url: base_url.into(),
                description: None,
                author: None,
                default_theme: Theme::default(),
            },
            build: BuildConfig::default(),
            content: ContentConfig::default(),
            rss: RssConfig::default(),
            components: BTreeMap::new(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `FOLIO__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        if self.build.words_per_minute == 0 {
            return Err(CoreError::config("build.words_per_minute must be positive"));
        }

        if self.content.categories.is_empty() {
            return Err(CoreError::config("content.categories cannot be empty"));
        }

        for category in &self.content.categories {
            if category.is_empty()
                || category.starts_with('.')
                || category.contains(['/', '\\'])
                || category == "tags"
            {
                return Err(CoreError::config(format!(
                    "invalid content category: {category:?}"
                )));
            }
        }

        for name in self.components.keys() {
            if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                return Err(CoreError::config(format!(
                    "component name must start with an uppercase letter: {name:?}"
                )));
            }
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
title = "Test Site"
base_url = "https://example.com"
default_theme = "dark"

[build]
output_dir = "dist"
syntax_theme = "InspiredGitHub"
words_per_minute = 250

[content]
categories = ["posts", "sketches", "notes"]

[rss]
limit = 15

[components.Aside]
element = "aside"
class = "aside"
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.title, "Test Site");
        assert_eq!(config.site.default_theme, Theme::Dark);
        assert_eq!(config.build.output_dir, "dist");
        assert_eq!(config.build.syntax_theme, "InspiredGitHub");
        assert_eq!(config.build.words_per_minute, 250);
        assert_eq!(config.content.categories, vec!["posts", "sketches", "notes"]);
        assert_eq!(config.rss.limit, 15);
        assert_eq!(
            config.components.get("Aside"),
            Some(&ComponentConfig {
                element: "aside".to_string(),
                class: Some("aside".to_string()),
            })
        );
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("folio.toml");
        let minimal_config = r#"
[site]
title = "Minimal Site"
base_url = "https://example.com"
"#;
        std::fs::write(&config_path, minimal_config).expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.default_theme, Theme::Light);
        assert_eq!(config.build.output_dir, "public");
        assert_eq!(config.build.content_dir, "content");
        assert_eq!(config.build.words_per_minute, 200);
        assert!(!config.build.drafts);
        assert_eq!(config.content.categories, vec!["posts", "sketches"]);
        assert!(config.rss.enabled);
        assert_eq!(config.rss.limit, 20);
        assert!(config.components.is_empty());
    }

    #[test]
    fn test_url_for() {
        let config = Config::new("Test", "https://example.com/");

        assert_eq!(
            config.url_for("/posts/hello"),
            "https://example.com/posts/hello"
        );
        assert_eq!(
            config.url_for("posts/hello"),
            "https://example.com/posts/hello"
        );
    }

    #[test]
    fn test_config_validation_empty_title() {
        let config = Config::new("", "https://example.com");
        let result = config.validate();
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("title cannot be empty")
        );
    }

    #[test]
    fn test_config_validation_bad_category() {
        let mut config = Config::new("Site", "https://example.com");
        config.content.categories = vec!["posts/2024".to_string()];
        assert!(config.validate().is_err());

        config.content.categories = vec!["tags".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_lowercase_component() {
        let mut config = Config::new("Site", "https://example.com");
        config.components.insert(
            "aside".to_string(),
            ComponentConfig {
                element: "aside".to_string(),
                class: None,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/folio.toml"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }
}
