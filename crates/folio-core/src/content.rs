//! Content types and structures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    frontmatter::{Frontmatter, parse_frontmatter},
};

/// Markup dialect of a content file, from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Plain Markdown (.md files).
    Markdown,
    /// Markdown with embedded components (.mdx files).
    Mdx,
}

impl ContentType {
    /// Determine content type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "mdx" => Some(Self::Mdx),
            _ => None,
        }
    }

    /// Get the file extension for this content type.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Mdx => "mdx",
        }
    }

    /// Whether embedded component tags are resolved for this dialect.
    pub fn supports_components(&self) -> bool {
        matches!(self, Self::Mdx)
    }
}

/// Color theme of a rendered page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Parse a theme name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// One routable content file: `/<category>/<slug>` backed by `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Content category (directory name), e.g. "posts".
    pub category: String,

    /// Public identifier, the file stem.
    pub slug: String,

    /// Source file path.
    pub path: PathBuf,

    /// Markup dialect.
    pub content_type: ContentType,
}

impl RouteDescriptor {
    /// Build a route from a content file path.
    ///
    /// Returns `None` for hidden files, files without a stem and unknown
    /// extensions.
    pub fn from_path(category: &str, path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        let content_type = ContentType::from_extension(extension)?;

        let slug = path.file_stem()?.to_str()?;
        if slug.is_empty() || slug.starts_with('.') {
            return None;
        }

        Some(Self {
            category: category.to_string(),
            slug: slug.to_string(),
            path: path.to_path_buf(),
            content_type,
        })
    }

    /// Get the URL path for this route.
    pub fn url(&self) -> String {
        format!("/{}/{}", self.category, self.slug)
    }
}

/// A content file split into metadata and body.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    /// Identifier derived from the filename.
    pub slug: String,

    /// Parsed front matter.
    pub frontmatter: Frontmatter,

    /// Remaining text after the front matter block.
    pub body: String,
}

impl ContentDocument {
    /// Split raw file text into a document.
    pub fn parse(slug: impl Into<String>, content: &str, path: &Path) -> Result<Self> {
        let (frontmatter, body) = parse_frontmatter(content, path)?;
        Ok(Self {
            slug: slug.into(),
            frontmatter,
            body,
        })
    }

    /// Read and split the file behind a route.
    pub fn load(route: &RouteDescriptor) -> Result<Self> {
        let content = std::fs::read_to_string(&route.path)?;
        Self::parse(route.slug.clone(), &content, &route.path)
    }
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

/// Plain-text excerpt of rendered HTML, cut at a word boundary.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let plain = strip_html(html);
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_at_word_boundary(&collapsed, max_chars)
}

/// Strip HTML tags from content.
fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Truncate text at word boundary, respecting UTF-8 character boundaries.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        return text.to_string();
    }

    let truncate_byte_idx = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());

    let truncated = &text[..truncate_byte_idx];

    if let Some(last_space_byte) = truncated.rfind(' ') {
        format!("{}...", &truncated[..last_space_byte])
    } else {
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(
            ContentType::from_extension("md"),
            Some(ContentType::Markdown)
        );
        assert_eq!(ContentType::from_extension("MDX"), Some(ContentType::Mdx));
        assert_eq!(ContentType::from_extension("txt"), None);
        assert!(ContentType::Mdx.supports_components());
        assert!(!ContentType::Markdown.supports_components());
    }

    #[test]
    fn test_route_from_path() {
        let route =
            RouteDescriptor::from_path("posts", Path::new("content/posts/hello-world.mdx"))
                .expect("route");

        assert_eq!(route.slug, "hello-world");
        assert_eq!(route.category, "posts");
        assert_eq!(route.content_type, ContentType::Mdx);
        assert_eq!(route.url(), "/posts/hello-world");
    }

    #[test]
    fn test_route_rejects_hidden_and_unknown() {
        assert!(RouteDescriptor::from_path("posts", Path::new("posts/.draft.mdx")).is_none());
        assert!(RouteDescriptor::from_path("posts", Path::new("posts/notes.txt")).is_none());
        assert!(RouteDescriptor::from_path("posts", Path::new("posts/README")).is_none());
    }

    #[test]
    fn test_theme_from_name() {
        assert_eq!(Theme::from_name("Dark"), Some(Theme::Dark));
        assert_eq!(Theme::from_name(" light "), Some(Theme::Light));
        assert_eq!(Theme::from_name("sepia"), None);
        assert_eq!(Theme::default().as_str(), "light");
    }

    #[test]
    fn test_document_parse() {
        let doc = ContentDocument::parse(
            "hello",
            "---\ntitle: Hello\n---\n# Hi there",
            Path::new("posts/hello.mdx"),
        )
        .unwrap();

        assert_eq!(doc.slug, "hello");
        assert_eq!(doc.frontmatter.title.as_deref(), Some("Hello"));
        assert_eq!(doc.body, "# Hi there");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(
            excerpt("<p>Hello <strong>World</strong></p>", 100),
            "Hello World"
        );
        assert_eq!(excerpt("<h1>Title</h1><p>Body text</p>", 100), "Title Body text");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let text = "Hello world this is a test";
        assert_eq!(truncate_at_word_boundary(text, 100), text);
        assert_eq!(truncate_at_word_boundary(text, 11), "Hello...");
        assert_eq!(truncate_at_word_boundary(text, 12), "Hello world...");

        let emoji_text = "Hello 🌟 World 📝 Test";
        assert_eq!(truncate_at_word_boundary(emoji_text, 10), "Hello 🌟...");

        let chinese_text = "你好世界 Hello World";
        assert_eq!(truncate_at_word_boundary(chinese_text, 7), "你好世界...");
    }
}
