//! Build orchestration.
//!
//! Coordinates the full site build: collect, render, write.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use folio_core::Config;
use folio_parser::html_escape;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assets::{self, AssetError},
    collector::{CollectorError, ContentCollector, Page, SiteContent},
    render::{PageRenderer, RenderContext, RenderError, category_label, output_path},
    rss::RssGenerator,
    sitemap::SitemapGenerator,
};

/// Build errors. Any of them aborts the build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// Rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Route manifest serialization error.
    #[error("route manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of entry pages generated.
    pub pages: usize,

    /// Number of listing pages (home, categories, tags) generated.
    pub listings: usize,

    /// Documents left out because they failed.
    pub failed: Vec<PathBuf>,

    /// Number of drafts skipped.
    pub drafts: usize,

    /// Number of static files copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// One line of `routes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub category: String,
    pub slug: String,
    pub url: String,
    pub source: PathBuf,
}

impl From<&Page> for RouteEntry {
    fn from(page: &Page) -> Self {
        Self {
            category: page.route.category.clone(),
            slug: page.route.slug.clone(),
            url: page.url(),
            source: page.route.path.clone(),
        }
    }
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    content_dir: PathBuf,
    output_dir: PathBuf,
    static_dir: Option<PathBuf>,
    body_extra: Option<String>,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(
        config: Config,
        content_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
            output_dir: output_dir.into(),
            static_dir: None,
            body_extra: None,
        }
    }

    /// Set the static assets directory.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Markup appended to every page body, e.g. a live reload script.
    #[must_use]
    pub fn with_body_extra(mut self, markup: impl Into<String>) -> Self {
        self.body_extra = Some(markup.into());
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            content = %self.content_dir.display(),
            output = %self.output_dir.display(),
            "starting build"
        );

        // Collect before touching the output so a store error leaves the
        // previous build in place.
        let collector = ContentCollector::new(self.config.clone(), &self.content_dir);
        let content = collector.collect()?;
        stats.failed = content.failures.iter().map(|f| f.path.clone()).collect();
        stats.drafts = content.drafts;

        self.clean_output()?;

        let renderer = PageRenderer::new();
        let mut ctx = RenderContext::from_config(&self.config);
        ctx.body_extra = self.body_extra.clone();

        stats.pages = self.write_pages(&renderer, &ctx, &content)?;
        let listing_paths = self.write_listings(&renderer, &ctx, &content)?;
        stats.listings = listing_paths.len();

        self.write_route_manifest(&content)?;

        let pages: Vec<&Page> = content.pages.iter().collect();
        if self.config.rss.enabled {
            let xml = RssGenerator::new(self.config.clone()).generate(&pages);
            fs::write(self.output_dir.join("rss.xml"), xml)?;
            debug!("wrote rss.xml");
        }

        let sitemap = SitemapGenerator::new(self.config.clone()).generate(&pages, &listing_paths);
        fs::write(self.output_dir.join("sitemap.xml"), sitemap)?;

        if let Some(static_dir) = &self.static_dir {
            stats.assets = assets::copy_static(static_dir, &self.output_dir)?;
        }
        assets::ensure_stylesheet(&self.output_dir)?;

        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            pages = stats.pages,
            listings = stats.listings,
            failed = stats.failed.len(),
            drafts = stats.drafts,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Clean the output directory.
    fn clean_output(&self) -> Result<()> {
        if self.output_dir.exists() {
            debug!(dir = %self.output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Write one document per entry, in parallel.
    fn write_pages(
        &self,
        renderer: &PageRenderer,
        ctx: &RenderContext,
        content: &SiteContent,
    ) -> Result<usize> {
        info!(count = content.pages.len(), "generating HTML pages");

        content.pages.par_iter().try_for_each(|page| {
            let page_ctx = ctx.with_theme(page.theme(self.config.site.default_theme));
            let html = renderer.render(page, &page_ctx)?;
            write_html(&output_path(&self.output_dir, &page.url()), &html)
        })?;

        Ok(content.pages.len())
    }

    /// Write home, category and tag listings. Returns the listing paths.
    fn write_listings(
        &self,
        renderer: &PageRenderer,
        ctx: &RenderContext,
        content: &SiteContent,
    ) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let mut emit = |path: String, html: String| -> Result<()> {
            write_html(&output_path(&self.output_dir, &path), &html)?;
            paths.push(path);
            Ok(())
        };

        let all: Vec<&Page> = content.pages.iter().collect();
        let home = renderer.render_list(
            &self.config.site.title,
            "/",
            self.config.site.description.as_deref(),
            &all,
            ctx,
        )?;
        emit("/".to_string(), home)?;

        for category in &self.config.content.categories {
            let path = format!("/{category}/");
            let pages = content.category_pages(category);
            let html = renderer.render_list(&category_label(category), &path, None, &pages, ctx)?;
            emit(path, html)?;
        }

        if !content.tags.is_empty() {
            let items = content
                .tags
                .iter()
                .map(|(slug, term)| {
                    format!(
                        r#"<li><a href="/tags/{slug}/" rel="tag">{}</a> ({})</li>"#,
                        html_escape(&term.name),
                        term.pages.len()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            let html = renderer.render_listing("Tags", "/tags/", None, &items, ctx)?;
            emit("/tags/".to_string(), html)?;
        }

        for (slug, term) in &content.tags {
            let path = format!("/tags/{slug}/");
            let pages = content.tag_pages(slug);
            let html =
                renderer.render_list(&format!("Tagged {}", term.name), &path, None, &pages, ctx)?;
            emit(path, html)?;
        }

        info!(count = paths.len(), "generated listing pages");
        Ok(paths)
    }

    /// Write `routes.json`: one entry per built page, sorted by URL.
    fn write_route_manifest(&self, content: &SiteContent) -> Result<()> {
        let mut routes: Vec<RouteEntry> = content.pages.iter().map(RouteEntry::from).collect();
        routes.sort_by(|a, b| a.url.cmp(&b.url));

        let json = serde_json::to_string_pretty(&routes)?;
        fs::write(self.output_dir.join("routes.json"), json)?;
        debug!(count = routes.len(), "wrote routes.json");
        Ok(())
    }
}

fn write_html(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    debug!(path = %path.display(), "wrote page");
    Ok(())
}
