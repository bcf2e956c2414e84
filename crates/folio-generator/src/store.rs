//! Content store access.
//!
//! The store is a directory per category with one file per entry:
//! `content/<category>/<slug>.<md|mdx>`. Listing is flat; subdirectories and
//! hidden files are ignored.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use folio_core::RouteDescriptor;
use thiserror::Error;
use tracing::{debug, trace};

/// Content store errors. All of them abort a build.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Category directory does not exist.
    #[error("content directory not found: {}", .0.display())]
    Missing(PathBuf),

    /// Directory could not be listed.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two files map to the same slug, ignoring case.
    #[error("duplicate slug {slug:?}: {} and {}", .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// List the routes of one category, sorted by slug.
pub fn enumerate_routes(content_dir: &Path, category: &str) -> Result<Vec<RouteDescriptor>> {
    let dir = content_dir.join(category);
    if !dir.is_dir() {
        return Err(StoreError::Missing(dir));
    }

    let mut routes = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
        let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
        let path = entry.path();

        if entry
            .file_name()
            .to_str()
            .is_none_or(|name| name.starts_with('.'))
        {
            trace!(path = %path.display(), "skipping hidden file");
            continue;
        }
        if !path.is_file() {
            continue;
        }

        match RouteDescriptor::from_path(category, &path) {
            Some(route) => routes.push(route),
            None => trace!(path = %path.display(), "skipping non-content file"),
        }
    }

    // Path order first so the duplicate report is stable.
    routes.sort_by(|a, b| a.path.cmp(&b.path));
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for route in &routes {
        let key = route.slug.to_lowercase();
        if let Some(first) = seen.get(&key) {
            return Err(StoreError::DuplicateSlug {
                slug: route.slug.clone(),
                first: first.clone(),
                second: route.path.clone(),
            });
        }
        seen.insert(key, route.path.clone());
    }

    routes.sort_by(|a, b| a.slug.cmp(&b.slug));
    debug!(category, count = routes.len(), "enumerated routes");
    Ok(routes)
}

/// The content store rooted at a directory, with its configured categories.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    categories: Vec<String>,
}

impl ContentStore {
    /// Create a store over `root` for the given categories.
    pub fn new(root: impl Into<PathBuf>, categories: impl IntoIterator<Item = String>) -> Self {
        Self {
            root: root.into(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Categories in navigation order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Every route of every category, grouped by category.
    pub fn routes(&self) -> Result<Vec<RouteDescriptor>> {
        let mut all = Vec::new();
        for category in &self.categories {
            all.extend(enumerate_routes(&self.root, category)?);
        }
        Ok(all)
    }

    /// Map a slug back to its content file.
    pub fn resolve(&self, category: &str, slug: &str) -> Result<Option<RouteDescriptor>> {
        if !self.categories.iter().any(|c| c == category) {
            return Ok(None);
        }
        Ok(enumerate_routes(&self.root, category)?
            .into_iter()
            .find(|route| route.slug == slug))
    }
}

#[cfg(test)]
mod tests {
    use folio_core::ContentType;
    use tempfile::TempDir;

    use super::*;

    fn store_with(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "---\ntitle: x\n---\nbody").unwrap();
        }
        dir
    }

    fn slugs(routes: &[RouteDescriptor]) -> Vec<&str> {
        routes.iter().map(|r| r.slug.as_str()).collect()
    }

    #[test]
    fn test_enumerate_sorted_by_slug() {
        let dir = store_with(&["posts/b.mdx", "posts/a.mdx", "posts/c.md"]);
        let routes = enumerate_routes(dir.path(), "posts").unwrap();

        assert_eq!(slugs(&routes), vec!["a", "b", "c"]);
        assert_eq!(routes[0].content_type, ContentType::Mdx);
        assert_eq!(routes[2].content_type, ContentType::Markdown);
        assert_eq!(routes[0].url(), "/posts/a");
    }

    #[test]
    fn test_enumerate_skips_noise() {
        let dir = store_with(&[
            "posts/real.mdx",
            "posts/.hidden.mdx",
            "posts/notes.txt",
            "posts/nested/deep.mdx",
        ]);
        let routes = enumerate_routes(dir.path(), "posts").unwrap();
        assert_eq!(slugs(&routes), vec!["real"]);
    }

    #[test]
    fn test_enumerate_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sketches")).unwrap();
        assert!(enumerate_routes(dir.path(), "sketches").unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = enumerate_routes(dir.path(), "posts").unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
        assert!(err.to_string().contains("posts"));
    }

    #[test]
    fn test_duplicate_slugs_rejected() {
        let dir = store_with(&["posts/hello.md", "posts/hello.mdx"]);
        let err = enumerate_routes(dir.path(), "posts").unwrap_err();
        match err {
            StoreError::DuplicateSlug { slug, first, second } => {
                assert_eq!(slug, "hello");
                assert!(first.ends_with("hello.md"));
                assert!(second.ends_with("hello.mdx"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_case_insensitive_duplicates_rejected() {
        let dir = store_with(&["posts/Hello.mdx", "posts/hello.md"]);
        assert!(matches!(
            enumerate_routes(dir.path(), "posts"),
            Err(StoreError::DuplicateSlug { .. })
        ));
    }

    #[test]
    fn test_store_routes_and_resolve() {
        let dir = store_with(&["posts/a.mdx", "sketches/flow.mdx"]);
        let store = ContentStore::new(
            dir.path(),
            ["posts".to_string(), "sketches".to_string()],
        );

        let routes = store.routes().unwrap();
        assert_eq!(slugs(&routes), vec!["a", "flow"]);
        assert_eq!(routes[1].category, "sketches");

        let found = store.resolve("sketches", "flow").unwrap().unwrap();
        assert!(found.path.ends_with("sketches/flow.mdx"));
        assert!(store.resolve("posts", "missing").unwrap().is_none());
        assert!(store.resolve("drafts", "a").unwrap().is_none());
    }
}
