//! Content collection and organization.
//!
//! Runs the per-document pipeline (split front matter, compile body, estimate
//! reading time) for every route in parallel. A document that fails is
//! reported and left out; the rest of the site still builds.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use folio_core::{
    Config, ContentDocument, CoreError, Frontmatter, ReadingTime, RouteDescriptor, Theme,
    TocEntry, content::excerpt,
};
use folio_parser::{CompileError, ComponentRegistry, ContentCompiler, slugify};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::{ContentStore, StoreError};

/// Characters kept in generated summaries.
const SUMMARY_LENGTH: usize = 160;

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The content store could not be listed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Why a single document was left out of the build.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Unreadable file or malformed front matter.
    #[error(transparent)]
    Parse(#[from] CoreError),

    /// Body could not be compiled.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

/// A document that failed its pipeline.
#[derive(Debug)]
pub struct DocumentFailure {
    /// Source file.
    pub path: PathBuf,

    /// What went wrong.
    pub error: DocumentError,
}

/// A fully processed entry, ready to render.
#[derive(Debug, Clone)]
pub struct Page {
    /// Where the entry lives.
    pub route: RouteDescriptor,

    /// Parsed front matter.
    pub frontmatter: Frontmatter,

    /// Rendered body HTML.
    pub content: String,

    /// Table of contents.
    pub toc: Vec<TocEntry>,

    /// Component names used by the body.
    pub components: Vec<String>,

    /// Reading time estimate of the body.
    pub reading_time: ReadingTime,

    /// Publication date, when the front matter has a readable one.
    pub date: Option<NaiveDate>,

    /// Description from front matter, or an excerpt of the body.
    pub summary: String,
}

impl Page {
    /// Display title; the slug when the front matter has none.
    pub fn title(&self) -> &str {
        self.frontmatter.title_or(&self.route.slug)
    }

    /// Public URL path.
    pub fn url(&self) -> String {
        self.route.url()
    }

    /// Theme for this page given the site default.
    pub fn theme(&self, default: Theme) -> Theme {
        self.frontmatter.theme_or(default)
    }

    /// Whether the page is marked as a draft.
    pub fn is_draft(&self) -> bool {
        self.frontmatter.draft
    }
}

/// A tag and the pages carrying it.
#[derive(Debug, Clone, Default)]
pub struct TagTerm {
    /// Tag as first written.
    pub name: String,

    /// URLs of tagged pages.
    pub pages: Vec<String>,
}

/// Collected site content.
#[derive(Debug, Default)]
pub struct SiteContent {
    /// All pages, newest first.
    pub pages: Vec<Page>,

    /// Tag slug -> term.
    pub tags: BTreeMap<String, TagTerm>,

    /// Documents left out because they failed.
    pub failures: Vec<DocumentFailure>,

    /// Number of drafts skipped.
    pub drafts: usize,
}

impl SiteContent {
    /// Pages of one category, newest first.
    pub fn category_pages(&self, category: &str) -> Vec<&Page> {
        self.pages
            .iter()
            .filter(|p| p.route.category == category)
            .collect()
    }

    /// Pages carrying a tag (by slug), newest first.
    pub fn tag_pages(&self, tag: &str) -> Vec<&Page> {
        self.tags
            .get(tag)
            .map(|term| {
                self.pages
                    .iter()
                    .filter(|p| term.pages.contains(&p.url()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up a page by URL.
    pub fn page(&self, url: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.url() == url)
    }
}

/// Content collector that enumerates the store and processes every entry.
#[derive(Debug)]
pub struct ContentCollector {
    config: Config,
    store: ContentStore,
    compiler: ContentCompiler,
}

impl ContentCollector {
    /// Create a collector over `content_dir` using the configured components.
    #[must_use]
    pub fn new(config: Config, content_dir: impl Into<PathBuf>) -> Self {
        let registry = Arc::new(ComponentRegistry::from_config(&config.components));
        let compiler = ContentCompiler::new(registry, &config.build.syntax_theme);
        Self::with_compiler(config, content_dir, compiler)
    }

    /// Create a collector with an explicit compiler.
    #[must_use]
    pub fn with_compiler(
        config: Config,
        content_dir: impl Into<PathBuf>,
        compiler: ContentCompiler,
    ) -> Self {
        let store = ContentStore::new(content_dir, config.content.categories.clone());
        Self {
            config,
            store,
            compiler,
        }
    }

    /// The store being collected.
    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Collect all content.
    pub fn collect(&self) -> Result<SiteContent> {
        info!(dir = %self.store.root().display(), "collecting content");

        let routes = self.store.routes()?;
        info!(count = routes.len(), "found content files");

        let results: Vec<_> = routes
            .par_iter()
            .map(|route| (route, self.process(route)))
            .collect();

        let mut content = SiteContent::default();
        for (route, result) in results {
            match result {
                Ok(page) if page.is_draft() && !self.config.build.drafts => {
                    debug!(url = %page.url(), "skipping draft");
                    content.drafts += 1;
                }
                Ok(page) => content.pages.push(page),
                Err(error) => {
                    warn!(path = %route.path.display(), error = %error, "skipping document");
                    content.failures.push(DocumentFailure {
                        path: route.path.clone(),
                        error,
                    });
                }
            }
        }

        sort_pages(&mut content.pages);
        content.tags = index_tags(&content.pages);

        info!(
            pages = content.pages.len(),
            tags = content.tags.len(),
            drafts = content.drafts,
            failures = content.failures.len(),
            "content collection complete"
        );

        Ok(content)
    }

    /// Run the pipeline for one route.
    pub fn process(&self, route: &RouteDescriptor) -> std::result::Result<Page, DocumentError> {
        debug!(path = %route.path.display(), "processing document");

        let document = ContentDocument::load(route)?;
        self.process_document(route, document)
    }

    /// Run the pipeline for a document already read from disk.
    pub fn process_document(
        &self,
        route: &RouteDescriptor,
        document: ContentDocument,
    ) -> std::result::Result<Page, DocumentError> {
        let compiled = self.compiler.compile(&document.body, route.content_type)?;
        let content = self.compiler.render(&compiled)?;
        let reading_time =
            ReadingTime::with_rate(&document.body, self.config.build.words_per_minute);

        let summary = document
            .frontmatter
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| excerpt(&content, SUMMARY_LENGTH));

        Ok(Page {
            route: route.clone(),
            date: document.frontmatter.published_date(),
            frontmatter: document.frontmatter,
            content,
            toc: compiled.toc,
            components: compiled.components.into_iter().collect(),
            reading_time,
            summary,
        })
    }

    /// Parse a single file outside the store, e.g. for `check` on one path.
    pub fn process_path(
        &self,
        category: &str,
        path: &Path,
    ) -> Option<std::result::Result<Page, DocumentError>> {
        let route = RouteDescriptor::from_path(category, path)?;
        Some(self.process(&route))
    }
}

/// Newest first; undated pages last, by title.
fn compare_pages(a: &Page, b: &Page) -> Ordering {
    match (&b.date, &a.date) {
        (Some(b_date), Some(a_date)) => b_date.cmp(a_date).then_with(|| a.title().cmp(b.title())),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.title().cmp(b.title()),
    }
}

/// Sort pages newest first.
pub fn sort_pages(pages: &mut [Page]) {
    pages.sort_by(compare_pages);
}

fn index_tags(pages: &[Page]) -> BTreeMap<String, TagTerm> {
    let mut tags: BTreeMap<String, TagTerm> = BTreeMap::new();
    for page in pages {
        for tag in &page.frontmatter.tags {
            let slug = slugify(tag);
            if slug.is_empty() {
                continue;
            }
            let term = tags.entry(slug).or_insert_with(|| TagTerm {
                name: tag.clone(),
                pages: Vec::new(),
            });
            let url = page.url();
            if !term.pages.contains(&url) {
                term.pages.push(url);
            }
        }
    }
    tags
}
