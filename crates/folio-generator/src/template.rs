//! HTML template system for page generation.
//!
//! Templates are plain strings with `{{ name }}` placeholders; `{{ name? }}`
//! renders as empty when the variable is absent. Values are inserted as-is,
//! so callers escape text before putting it into a context.

use std::collections::HashMap;

use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Variables available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert only when `value` is present and non-empty.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.insert(key, value);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// A named template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with `context`.
    ///
    /// Substituted values are never scanned again, so a value containing
    /// `{{` is emitted literally.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                TemplateError::InvalidSyntax(format!("unclosed {{{{ in template {}", self.name))
            })?;

            let var = after[..end].trim();
            let (var, optional) = match var.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (var, false),
            };

            match context.get(var) {
                Some(value) => out.push_str(value),
                None if optional => {}
                None => return Err(TemplateError::MissingVariable(var.to_string())),
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Templates by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Registry with the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Template::new("base", BASE_TEMPLATE));
        registry.register(Template::new("entry", ENTRY_TEMPLATE));
        registry.register(Template::new("list", LIST_TEMPLATE));
        registry
    }

    /// Add or replace a template.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
            .render(context)
    }
}

/// Document shell: head, navigation, main slot and footer.
pub const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en" data-theme="{{ theme }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}{{ title_suffix? }}</title>
    <meta name="description" content="{{ description? }}">
    <meta name="author" content="{{ author? }}">
    <link rel="canonical" href="{{ canonical_url }}">
    <link rel="alternate" type="application/rss+xml" title="{{ site_title }}" href="/rss.xml">
    <link rel="stylesheet" href="/style.css">
</head>
<body class="theme-{{ theme }}">
    <header>
        <nav class="site-nav">
            <a href="/" class="site-title">{{ site_title }}</a>
            <ul class="nav-links">{{ nav }}</ul>
        </nav>
    </header>
    <main>
        {{ content }}
    </main>
    <footer>
        <p>&copy; {{ year }} {{ site_title }}</p>
    </footer>
    {{ body_extra? }}
</body>
</html>"#;

/// One entry with its chrome.
pub const ENTRY_TEMPLATE: &str = r#"<article class="entry entry-{{ category }}">
    <a class="back" href="{{ back_url }}">&larr; {{ back_label }}</a>
    {{ thumbnail? }}
    <header>
        <h1>{{ title }}</h1>
        <p class="meta">{{ date? }}<span class="reading-time">{{ reading_time }}</span>{{ level? }}</p>
        {{ tags? }}
    </header>
    <div class="content">
        {{ content }}
    </div>
</article>"#;

/// Listing of entries: category index, home page and tag pages.
pub const LIST_TEMPLATE: &str = r#"<section class="listing">
    <h1>{{ heading }}</h1>
    {{ intro? }}
    <ul class="entries">
        {{ items }}
    </ul>
</section>"#;
