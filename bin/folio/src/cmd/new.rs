//! New command - create a content entry with front matter

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr, bail};
use folio_core::{
    Config, ContentType, Frontmatter,
    frontmatter::{FrontmatterFormat, join_frontmatter},
};

use super::{SitePaths, load_config};

/// Run the new command.
///
/// `entry` is `<category>/<slug>`, e.g. `posts/my-article`.
pub fn run(config_path: &Path, entry: &str, title: Option<&str>, markdown: bool) -> Result<()> {
    tracing::info!(?config_path, entry, markdown, "Creating new content");

    let config = load_config(config_path)?;
    let paths = SitePaths::resolve(config_path, &config);
    let content_type = if markdown {
        ContentType::Markdown
    } else {
        ContentType::Mdx
    };

    let file_path = create_entry(&config, &paths.content, entry, title, content_type)?;

    tracing::info!(?file_path, "Created new content file");
    println!("Created: {}", file_path.display());

    Ok(())
}

/// Write a draft entry below `content_dir`. Never overwrites.
pub fn create_entry(
    config: &Config,
    content_dir: &Path,
    entry: &str,
    title: Option<&str>,
    content_type: ContentType,
) -> Result<PathBuf> {
    let Some((category, slug)) = entry.trim_matches('/').split_once('/') else {
        bail!("Expected <category>/<slug>, got {entry:?}");
    };
    if !config.content.categories.iter().any(|c| c == category) {
        bail!(
            "Unknown category {category:?}, configured: {}",
            config.content.categories.join(", ")
        );
    }
    if slug.is_empty() || slug.contains(['/', '\\', '.']) {
        bail!("Invalid slug {slug:?}");
    }

    let file_path = content_dir
        .join(category)
        .join(format!("{slug}.{}", content_type.extension()));
    if file_path.exists() {
        bail!("{} already exists", file_path.display());
    }

    let frontmatter = Frontmatter {
        title: Some(title.map_or_else(|| title_from_slug(slug), str::to_string)),
        published_at: Some(Utc::now().format("%Y-%m-%d").to_string()),
        draft: true,
        ..Frontmatter::default()
    };
    let source = join_frontmatter(FrontmatterFormat::Yaml, &frontmatter, "\nWrite here.\n")
        .wrap_err("Failed to write front matter")?;

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).wrap_err("Failed to create directories")?;
    }
    fs::write(&file_path, source).wrap_err("Failed to write file")?;

    Ok(file_path)
}

/// `my-first-post` becomes `My first post`.
fn title_from_slug(slug: &str) -> String {
    let words = slug.replace(['-', '_'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
