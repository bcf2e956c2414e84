//! Syntax highlighting for fenced code blocks.

use syntect::{highlighting::ThemeSet, html::highlighted_html_for_string, parsing::SyntaxSet};
use tracing::{debug, warn};

use crate::html_escape;

/// Syntax highlighter using syntect.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("base16-ocean.dark")
    }
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter with the specified theme.
    pub fn new(theme: &str) -> Self {
        let mut highlighter = Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme: "base16-ocean.dark".to_string(),
        };
        highlighter.set_theme(theme);
        highlighter
    }

    /// Get available theme names.
    pub fn available_themes(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(String::as_str).collect()
    }

    /// Name of the active theme.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Switch theme. Unknown names keep the current theme and return `false`.
    pub fn set_theme(&mut self, theme: &str) -> bool {
        if self.theme_set.themes.contains_key(theme) {
            self.theme = theme.to_string();
            true
        } else {
            warn!(theme, current = %self.theme, "unknown syntax theme, keeping current");
            false
        }
    }

    /// Highlight code in the given language.
    ///
    /// The result is wrapped in `<figure class="code">` with the language in
    /// `data-lang`. Unknown languages are highlighted as plain text.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang
            .and_then(|l| self.syntax_set.find_syntax_by_token(l))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let inner = match self.theme_set.themes.get(&self.theme) {
            Some(theme) => highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                .unwrap_or_else(|e| {
                    debug!(error = %e, "highlighting failed, emitting plain block");
                    plain_block(code, lang)
                }),
            None => plain_block(code, lang),
        };

        let data_lang = lang
            .map(|l| format!(r#" data-lang="{}""#, html_escape(l)))
            .unwrap_or_default();
        format!("<figure class=\"code\"{data_lang}>{inner}</figure>\n")
    }
}

fn plain_block(code: &str, lang: Option<&str>) -> String {
    let lang_class = lang
        .map(|l| format!(r#" class="language-{}""#, html_escape(l)))
        .unwrap_or_default();
    format!("<pre><code{lang_class}>{}</code></pre>", html_escape(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust() {
        let highlighter = SyntaxHighlighter::default();
        let code = "fn main() {\n    println!(\"Hello\");\n}";
        let html = highlighter.highlight(code, Some("rust"));

        assert!(html.starts_with(r#"<figure class="code" data-lang="rust">"#));
        assert!(html.contains("<pre"));
        assert!(html.contains("fn"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("some code", Some("unknown_lang_xyz"));

        assert!(html.contains("some code"));
        assert!(html.contains(r#"data-lang="unknown_lang_xyz""#));
    }

    #[test]
    fn test_highlight_escapes_markup() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("<script>", None);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_set_theme() {
        let mut highlighter = SyntaxHighlighter::default();
        assert!(highlighter.set_theme("InspiredGitHub"));
        assert_eq!(highlighter.theme(), "InspiredGitHub");
        assert!(!highlighter.set_theme("no-such-theme"));
        assert_eq!(highlighter.theme(), "InspiredGitHub");
    }

    #[test]
    fn test_available_themes() {
        let highlighter = SyntaxHighlighter::default();
        let themes = highlighter.available_themes();

        assert!(themes.contains(&"base16-ocean.dark"));
    }
}
