//! Folio Parser Library
//!
//! Compiles Markdown and MDX bodies into renderable node trees.

pub mod mdx;
pub mod registry;
pub mod syntax;

use std::sync::Arc;

use folio_core::ContentType;
pub use mdx::{CompileError, CompiledBody, MdxCompiler, Node};
pub use registry::{Component, ComponentRegistry, Props};
pub use syntax::SyntaxHighlighter;

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Compiler paired with the registry its bodies are resolved against.
///
/// Cheap to share across threads: the registry sits behind an `Arc` and is
/// never mutated after construction.
#[derive(Debug)]
pub struct ContentCompiler {
    compiler: MdxCompiler,
    registry: Arc<ComponentRegistry>,
}

impl ContentCompiler {
    /// Create a compiler for `registry` using the given syntax theme.
    pub fn new(registry: Arc<ComponentRegistry>, syntax_theme: &str) -> Self {
        Self {
            compiler: MdxCompiler::with_theme(syntax_theme),
            registry,
        }
    }

    /// The registry components are resolved against.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Compile a body according to its dialect.
    pub fn compile(&self, body: &str, content_type: ContentType) -> Result<CompiledBody> {
        if content_type.supports_components() {
            self.compiler.compile(body, &self.registry)
        } else {
            Ok(self.compiler.compile_markdown(body))
        }
    }

    /// Render a compiled body to HTML.
    pub fn render(&self, body: &CompiledBody) -> Result<String> {
        body.render(&self.registry)
    }
}

impl Default for ContentCompiler {
    fn default() -> Self {
        Self {
            compiler: MdxCompiler::new(),
            registry: Arc::new(ComponentRegistry::with_builtins()),
        }
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate a URL-safe anchor from heading or tag text.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdx_resolves_components() {
        let compiler = ContentCompiler::default();
        let body = compiler
            .compile("<YouTube id=\"abc\" />", ContentType::Mdx)
            .unwrap();

        assert!(body.components.contains("YouTube"));
        assert!(compiler.render(&body).unwrap().contains("embed/abc"));
    }

    #[test]
    fn test_markdown_keeps_tags_raw() {
        let compiler = ContentCompiler::default();
        let body = compiler
            .compile("<Unknown />\n", ContentType::Markdown)
            .unwrap();

        assert!(body.components.is_empty());
        assert!(compiler.render(&body).unwrap().contains("<Unknown />"));
    }

    #[test]
    fn test_unknown_component_in_mdx() {
        let compiler = ContentCompiler::default();
        let err = compiler
            .compile("<Unknown />\n", ContentType::Mdx)
            .unwrap_err();
        assert_eq!(err.tag(), "Unknown");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Getting Started!"), "getting-started");
        assert_eq!(slugify("foo--bar"), "foo-bar");
        assert_eq!(slugify("Rust 2024"), "rust-2024");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"q\""), "&quot;q&quot;");
    }
}
