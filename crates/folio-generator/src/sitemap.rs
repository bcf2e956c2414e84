//! Sitemap generation.

use chrono::NaiveDate;
use folio_core::Config;
use tracing::debug;

use crate::collector::Page;

/// Change frequency for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFreq {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// A sitemap URL entry.
#[derive(Debug, Clone)]
pub struct SitemapUrl {
    /// Absolute URL.
    pub loc: String,

    /// Last modification date.
    pub lastmod: Option<NaiveDate>,

    pub changefreq: ChangeFreq,

    /// Priority (0.0 to 1.0).
    pub priority: f32,
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator {
    config: Config,
}

impl SitemapGenerator {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Sitemap XML for entry pages plus listing paths (`/`, `/posts/`, ...).
    pub fn generate(&self, pages: &[&Page], listings: &[String]) -> String {
        debug!(
            pages = pages.len(),
            listings = listings.len(),
            "generating sitemap"
        );

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

        for path in listings {
            xml.push_str(&url_to_xml(&self.listing_to_url(path)));
        }
        for page in pages {
            xml.push_str(&url_to_xml(&self.page_to_url(page)));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn listing_to_url(&self, path: &str) -> SitemapUrl {
        let (changefreq, priority) = if path == "/" {
            (ChangeFreq::Daily, 1.0)
        } else if path.starts_with("/tags/") {
            (ChangeFreq::Weekly, 0.3)
        } else {
            (ChangeFreq::Weekly, 0.6)
        };

        SitemapUrl {
            loc: self.config.url_for(path),
            lastmod: None,
            changefreq,
            priority,
        }
    }

    fn page_to_url(&self, page: &Page) -> SitemapUrl {
        let (changefreq, priority) = if page.date.is_some() {
            (ChangeFreq::Monthly, 0.8)
        } else {
            (ChangeFreq::Yearly, 0.5)
        };

        SitemapUrl {
            loc: self.config.url_for(&page.url()),
            lastmod: page.date,
            changefreq,
            priority,
        }
    }
}

fn url_to_xml(url: &SitemapUrl) -> String {
    let mut xml = String::from("  <url>\n");
    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));
    if let Some(lastmod) = url.lastmod {
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            lastmod.format("%Y-%m-%d")
        ));
    }
    xml.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        url.changefreq.as_str()
    ));
    xml.push_str(&format!("    <priority>{:.1}</priority>\n", url.priority));
    xml.push_str("  </url>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use folio_core::{Frontmatter, ReadingTime, RouteDescriptor};

    use super::*;

    fn test_page(category: &str, slug: &str, date: Option<&str>) -> Page {
        let path = format!("{category}/{slug}.mdx");
        let frontmatter = Frontmatter {
            published_at: date.map(str::to_string),
            ..Frontmatter::default()
        };
        Page {
            route: RouteDescriptor::from_path(category, Path::new(&path)).unwrap(),
            date: frontmatter.published_date(),
            frontmatter,
            content: String::new(),
            toc: Vec::new(),
            components: Vec::new(),
            reading_time: ReadingTime::default(),
            summary: String::new(),
        }
    }

    #[test]
    fn test_generate_sitemap() {
        let generator = SitemapGenerator::new(Config::new("Test", "https://example.com"));
        let post = test_page("posts", "hello", Some("2024-01-15"));
        let sketch = test_page("sketches", "flow", None);

        let xml = generator.generate(&[&post, &sketch], &["/".to_string(), "/posts/".to_string()]);

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/posts/</loc>"));
        assert!(xml.contains("<loc>https://example.com/posts/hello</loc>"));
        assert!(xml.contains("<lastmod>2024-01-15</lastmod>"));
        assert!(xml.contains("<loc>https://example.com/sketches/flow</loc>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }
}
