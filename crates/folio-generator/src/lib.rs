//! Folio Generator Library
//!
//! Turns a content store into a static site.
//!
//! # Modules
//!
//! - [`store`] - Route enumeration over the content store
//! - [`collector`] - Per-document pipeline and site content index
//! - [`template`] - HTML template system with variable interpolation
//! - [`render`] - Page and listing rendering
//! - [`rss`] - RSS feed generation
//! - [`sitemap`] - XML sitemap generation
//! - [`assets`] - Static asset copying
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod collector;
pub mod render;
pub mod rss;
pub mod sitemap;
pub mod store;
pub mod template;

pub use build::{BuildError, BuildStats, Builder, RouteEntry};
pub use collector::{
    ContentCollector, DocumentError, DocumentFailure, Page, SiteContent, TagTerm,
};
pub use render::{NavLink, PageRenderer, RenderContext};
pub use rss::RssGenerator;
pub use sitemap::SitemapGenerator;
pub use store::{ContentStore, StoreError, enumerate_routes};
pub use template::{Template, TemplateContext, TemplateRegistry};
