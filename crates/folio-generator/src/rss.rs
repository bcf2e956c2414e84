//! RSS feed generation.
//!
//! Only dated entries go into the feed, newest first.

use chrono::{NaiveTime, Utc};
use folio_core::Config;
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::debug;

use crate::collector::Page;

/// RSS feed generator.
#[derive(Debug)]
pub struct RssGenerator {
    config: Config,
}

impl RssGenerator {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Feed XML for `pages`, which are expected newest first.
    pub fn generate(&self, pages: &[&Page]) -> String {
        let limit = self.config.rss.limit;
        let items: Vec<Item> = pages
            .iter()
            .filter(|p| p.date.is_some())
            .take(limit)
            .map(|p| self.page_to_item(p))
            .collect();

        debug!(count = items.len(), limit, "generating RSS feed");

        let site = &self.config.site;
        ChannelBuilder::default()
            .title(site.title.as_str())
            .link(site.base_url.trim_end_matches('/'))
            .description(site.description.as_deref().unwrap_or(&site.title))
            .last_build_date(Some(Utc::now().to_rfc2822()))
            .items(items)
            .build()
            .to_string()
    }

    fn page_to_item(&self, page: &Page) -> Item {
        let url = self.config.url_for(&page.url());
        let guid = GuidBuilder::default().value(url.clone()).permalink(true).build();

        let mut builder = ItemBuilder::default();
        builder
            .title(Some(page.title().to_string()))
            .link(Some(url))
            .guid(Some(guid))
            .description(Some(page.summary.clone()).filter(|s| !s.is_empty()))
            .author(self.config.site.author.clone());

        if let Some(date) = page.date {
            builder.pub_date(Some(date.and_time(NaiveTime::MIN).and_utc().to_rfc2822()));
        }

        let categories: Vec<_> = page
            .frontmatter
            .tags
            .iter()
            .map(|tag| rss::Category {
                name: tag.clone(),
                domain: None,
            })
            .collect();
        builder.categories(categories);

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use folio_core::{Frontmatter, ReadingTime, RouteDescriptor};

    use super::*;

    fn test_config() -> Config {
        let mut config = Config::new("Test Blog", "https://example.com");
        config.site.description = Some("A test blog".to_string());
        config.site.author = Some("Test Author".to_string());
        config
    }

    fn test_page(slug: &str, title: &str, date: Option<&str>) -> Page {
        let route =
            RouteDescriptor::from_path("posts", Path::new(&format!("posts/{slug}.mdx"))).unwrap();
        let frontmatter = Frontmatter {
            title: Some(title.to_string()),
            published_at: date.map(str::to_string),
            tags: vec!["rust".to_string(), "web".to_string()],
            ..Frontmatter::default()
        };
        Page {
            route,
            date: frontmatter.published_date(),
            frontmatter,
            content: String::new(),
            toc: Vec::new(),
            components: Vec::new(),
            reading_time: ReadingTime::default(),
            summary: format!("Summary of {title}"),
        }
    }

    #[test]
    fn test_generate_rss() {
        let generator = RssGenerator::new(test_config());
        let page1 = test_page("first", "First Post", Some("2024-02-01"));
        let page2 = test_page("second", "Second Post", Some("2024-01-01"));

        let xml = generator.generate(&[&page1, &page2]);

        assert!(xml.contains("<title>Test Blog</title>"));
        assert!(xml.contains("<link>https://example.com</link>"));
        assert!(xml.contains("<link>https://example.com/posts/first</link>"));
        assert!(xml.contains("Second Post"));
        assert!(xml.contains("<category>rust</category>"));
        assert!(xml.contains("<pubDate>Thu, "));
        assert!(xml.contains("Feb 2024 00:00:00"));
    }

    #[test]
    fn test_rss_skips_undated_and_limits() {
        let mut config = test_config();
        config.rss.limit = 1;
        let generator = RssGenerator::new(config);

        let undated = test_page("sketch", "Undated", None);
        let first = test_page("first", "First Post", Some("2024-02-01"));
        let second = test_page("second", "Second Post", Some("2024-01-01"));

        let xml = generator.generate(&[&undated, &first, &second]);

        assert!(!xml.contains("Undated"));
        assert!(xml.contains("First Post"));
        assert!(!xml.contains("Second Post"));
    }
}
