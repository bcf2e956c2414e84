//! Page rendering.
//!
//! Wraps compiled bodies and listings in the site chrome. The theme is part
//! of the explicit [`RenderContext`]; nothing is read from process state.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use folio_core::{Config, Theme};
use folio_parser::{html_escape, slugify};
use thiserror::Error;
use tracing::debug;

use crate::{
    collector::Page,
    template::{TemplateContext, TemplateError, TemplateRegistry},
};

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

/// Result type for rendering.
pub type Result<T> = std::result::Result<T, RenderError>;

/// One navigation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    pub url: String,
}

impl NavLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Everything outside the page itself that shapes its HTML.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Theme of the rendered document.
    pub theme: Theme,

    /// Site title shown in the header and `<title>`.
    pub site_title: String,

    /// Site author for meta tags.
    pub author: Option<String>,

    /// Site description, used when a page has none.
    pub description: Option<String>,

    /// Navigation links, in order.
    pub nav: Vec<NavLink>,

    /// Base URL for canonical links.
    pub base_url: String,

    /// Markup appended before `</body>`.
    pub body_extra: Option<String>,
}

impl RenderContext {
    /// Context for a site: default theme, one nav link per category.
    pub fn from_config(config: &Config) -> Self {
        let nav = config
            .content
            .categories
            .iter()
            .map(|c| NavLink::new(category_label(c), format!("/{c}/")))
            .collect();

        Self {
            theme: config.site.default_theme,
            site_title: config.site.title.clone(),
            author: config.site.author.clone(),
            description: config.site.description.clone(),
            nav,
            base_url: config.site.base_url.trim_end_matches('/').to_string(),
            body_extra: None,
        }
    }

    /// Same context with another theme.
    #[must_use]
    pub fn with_theme(&self, theme: Theme) -> Self {
        Self {
            theme,
            ..self.clone()
        }
    }

    fn canonical(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// "sketches" -> "Sketches".
pub fn category_label(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders entries and listings into full HTML documents.
#[derive(Debug, Default)]
pub struct PageRenderer {
    templates: TemplateRegistry,
}

impl PageRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: TemplateRegistry::new(),
        }
    }

    /// Render one entry.
    pub fn render(&self, page: &Page, ctx: &RenderContext) -> Result<String> {
        debug!(url = %page.url(), theme = ctx.theme.as_str(), "rendering page");
        let fm = &page.frontmatter;

        let mut inner = TemplateContext::new()
            .with_var("category", html_escape(&page.route.category))
            .with_var("back_url", html_escape(&format!("/{}/", page.route.category)))
            .with_var(
                "back_label",
                html_escape(&category_label(&page.route.category)),
            )
            .with_var("title", html_escape(page.title()))
            .with_var("reading_time", page.reading_time.label())
            .with_var("content", &page.content);

        inner.insert_opt(
            "thumbnail",
            fm.thumbnail.as_deref().map(|src| {
                format!(
                    r#"<img class="thumbnail" src="{}" alt="{}">"#,
                    html_escape(src),
                    html_escape(page.title())
                )
            }),
        );
        inner.insert_opt(
            "date",
            page.date.map(|d| {
                format!(
                    r#"<time datetime="{}">{}</time> &middot; "#,
                    d.format("%Y-%m-%d"),
                    d.format("%B %-d, %Y")
                )
            }),
        );
        inner.insert_opt(
            "level",
            fm.level
                .as_deref()
                .map(|l| format!(r#" &middot; <span class="level">{}</span>"#, html_escape(l))),
        );
        inner.insert_opt("tags", tags_html(&fm.tags));

        let body = self.templates.render("entry", &inner)?;
        let description = Some(page.summary.clone()).filter(|s| !s.is_empty());
        self.wrap(ctx, page.title(), &page.url(), description, &body)
    }

    /// Render a listing page (`/`, `/<category>/`, `/tags/<tag>/`).
    pub fn render_list(
        &self,
        heading: &str,
        path: &str,
        intro: Option<&str>,
        pages: &[&Page],
        ctx: &RenderContext,
    ) -> Result<String> {
        debug!(path, count = pages.len(), "rendering listing");

        let items = if pages.is_empty() {
            r#"<li class="empty">Nothing here yet.</li>"#.to_string()
        } else {
            pages
                .iter()
                .map(|p| list_item_html(p))
                .collect::<Vec<_>>()
                .join("\n        ")
        };

        self.render_listing(heading, path, intro, &items, ctx)
    }

    /// Render a listing from prepared `<li>` markup.
    pub fn render_listing(
        &self,
        heading: &str,
        path: &str,
        intro: Option<&str>,
        items_html: &str,
        ctx: &RenderContext,
    ) -> Result<String> {
        let mut inner = TemplateContext::new()
            .with_var("heading", html_escape(heading))
            .with_var("items", items_html);
        inner.insert_opt(
            "intro",
            intro.map(|i| format!(r#"<p class="intro">{}</p>"#, html_escape(i))),
        );

        let body = self.templates.render("list", &inner)?;
        self.wrap(ctx, heading, path, intro.map(str::to_string), &body)
    }

    fn wrap(
        &self,
        ctx: &RenderContext,
        title: &str,
        path: &str,
        description: Option<String>,
        body: &str,
    ) -> Result<String> {
        let nav = ctx
            .nav
            .iter()
            .map(|link| {
                format!(
                    r#"<li><a href="{}">{}</a></li>"#,
                    html_escape(&link.url),
                    html_escape(&link.label)
                )
            })
            .collect::<String>();

        let mut base = TemplateContext::new()
            .with_var("theme", ctx.theme.as_str())
            .with_var("title", html_escape(title))
            .with_var("site_title", html_escape(&ctx.site_title))
            .with_var("canonical_url", html_escape(&ctx.canonical(path)))
            .with_var("nav", nav)
            .with_var("content", body)
            .with_var("year", Utc::now().year().to_string());

        if title != ctx.site_title {
            base.insert("title_suffix", format!(" | {}", html_escape(&ctx.site_title)));
        }
        base.insert_opt(
            "description",
            description
                .or_else(|| ctx.description.clone())
                .map(|d| html_escape(&d)),
        );
        base.insert_opt("author", ctx.author.as_deref().map(html_escape));
        base.insert_opt("body_extra", ctx.body_extra.clone());

        Ok(self.templates.render("base", &base)?)
    }
}

fn tags_html(tags: &[String]) -> Option<String> {
    let links: Vec<_> = tags
        .iter()
        .filter_map(|tag| {
            let slug = slugify(tag);
            (!slug.is_empty()).then(|| {
                format!(
                    r#"<a href="/tags/{slug}/" rel="tag">{}</a>"#,
                    html_escape(tag)
                )
            })
        })
        .collect();

    (!links.is_empty()).then(|| format!(r#"<div class="tags">{}</div>"#, links.join(" ")))
}

/// One row of a listing.
pub fn list_item_html(page: &Page) -> String {
    let date = page
        .date
        .map(|d| format!(r#"<time datetime="{0}">{0}</time>"#, d.format("%Y-%m-%d")))
        .unwrap_or_default();
    let summary = if page.summary.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="summary">{}</p>"#, html_escape(&page.summary))
    };

    format!(
        r#"<li class="entry-item"><a href="{}">{}</a> {date}<span class="reading-time">{}</span>{summary}</li>"#,
        html_escape(&page.url()),
        html_escape(page.title()),
        page.reading_time.label()
    )
}

/// Output file for a URL path: `/posts/a` -> `<out>/posts/a/index.html`.
pub fn output_path(output_dir: &Path, url: &str) -> PathBuf {
    let trimmed = url.trim_matches('/');
    if trimmed.is_empty() {
        output_dir.join("index.html")
    } else {
        output_dir.join(trimmed).join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use folio_core::{Frontmatter, ReadingTime, RouteDescriptor};

    use super::*;

    fn test_page() -> Page {
        let route = RouteDescriptor::from_path("posts", Path::new("content/posts/hello.mdx"))
            .expect("route");
        let frontmatter = Frontmatter {
            title: Some("Hello <World>".to_string()),
            published_at: Some("2024-03-05".to_string()),
            tags: vec!["Rust".to_string(), "Web Dev".to_string()],
            level: Some("beginner".to_string()),
            thumbnail: Some("/images/hello.png".to_string()),
            ..Frontmatter::default()
        };
        Page {
            route,
            date: frontmatter.published_date(),
            frontmatter,
            content: "<p>Body</p>".to_string(),
            toc: Vec::new(),
            components: Vec::new(),
            reading_time: ReadingTime::estimate("a few words here"),
            summary: "A short summary".to_string(),
        }
    }

    fn ctx() -> RenderContext {
        RenderContext::from_config(&Config::new("My Site", "https://example.com/"))
    }

    #[test]
    fn test_render_entry_chrome() {
        let html = PageRenderer::new().render(&test_page(), &ctx()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"data-theme="light""#));
        assert!(html.contains("<title>Hello &lt;World&gt; | My Site</title>"));
        assert!(html.contains("<h1>Hello &lt;World&gt;</h1>"));
        assert!(html.contains(r#"<a class="back" href="/posts/">"#));
        assert!(html.contains(r#"<img class="thumbnail" src="/images/hello.png""#));
        assert!(html.contains(r#"<time datetime="2024-03-05">March 5, 2024</time>"#));
        assert!(html.contains("1 min read"));
        assert!(html.contains(r#"<span class="level">beginner</span>"#));
        assert!(html.contains(r#"href="/tags/web-dev/""#));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains(r#"<link rel="canonical" href="https://example.com/posts/hello">"#));
        assert!(html.contains(r#"<li><a href="/posts/">Posts</a></li>"#));
        assert!(html.contains(r#"<li><a href="/sketches/">Sketches</a></li>"#));
    }

    #[test]
    fn test_theme_comes_from_context() {
        let renderer = PageRenderer::new();
        let page = test_page();

        let dark = renderer
            .render(&page, &ctx().with_theme(Theme::Dark))
            .unwrap();
        assert!(dark.contains(r#"data-theme="dark""#));
        assert!(!dark.contains(r#"data-theme="light""#));
    }

    #[test]
    fn test_optional_chrome_omitted() {
        let mut page = test_page();
        page.frontmatter = Frontmatter::default();
        page.date = None;

        let html = PageRenderer::new().render(&page, &ctx()).unwrap();
        assert!(html.contains("<h1>hello</h1>"));
        assert!(!html.contains("thumbnail"));
        assert!(!html.contains("<time"));
        assert!(!html.contains(r#"class="tags""#));
        assert!(!html.contains(r#"class="level""#));
    }

    #[test]
    fn test_body_extra_injected() {
        let mut ctx = ctx();
        ctx.body_extra = Some("<script>reload()</script>".to_string());
        let html = PageRenderer::new().render(&test_page(), &ctx).unwrap();
        assert!(html.contains("<script>reload()</script>\n</body>"));
    }

    #[test]
    fn test_render_list() {
        let page = test_page();
        let html = PageRenderer::new()
            .render_list("Posts", "/posts/", None, &[&page], &ctx())
            .unwrap();

        assert!(html.contains("<h1>Posts</h1>"));
        assert!(html.contains(r#"<a href="/posts/hello">Hello &lt;World&gt;</a>"#));
        assert!(html.contains("A short summary"));

        let empty = PageRenderer::new()
            .render_list("Tag: rust", "/tags/rust/", None, &[], &ctx())
            .unwrap();
        assert!(empty.contains("Nothing here yet."));
    }

    #[test]
    fn test_list_item_href_is_escaped() {
        let mut page = test_page();
        page.route =
            RouteDescriptor::from_path("posts", Path::new(r#"content/posts/x" onmouseover="y.mdx"#))
                .expect("route");

        let item = list_item_html(&page);

        assert!(item.contains(r#"<a href="/posts/x&quot; onmouseover=&quot;y">"#));
        assert!(!item.contains(r#"" onmouseover=""#));
    }

    #[test]
    fn test_output_path() {
        let out = Path::new("public");
        assert_eq!(
            output_path(out, "/posts/hello"),
            PathBuf::from("public/posts/hello/index.html")
        );
        assert_eq!(output_path(out, "/"), PathBuf::from("public/index.html"));
        assert_eq!(
            output_path(out, "/tags/rust/"),
            PathBuf::from("public/tags/rust/index.html")
        );
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("sketches"), "Sketches");
        assert_eq!(category_label(""), "");
    }
}
