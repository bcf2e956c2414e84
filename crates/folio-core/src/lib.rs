//! Folio Core Library
//!
//! Core types, front matter handling, reading time and configuration for the
//! Folio static site generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;
pub mod reading;

pub use config::Config;
pub use content::{ContentDocument, ContentType, RouteDescriptor, Theme, TocEntry};
pub use error::{CoreError, Result};
pub use frontmatter::{Frontmatter, FrontmatterFormat, RawFrontmatter};
pub use reading::ReadingTime;
