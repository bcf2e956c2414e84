//! Check command - validate configuration and content

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, bail};
use folio_core::{Config, Theme};
use folio_generator::{ContentCollector, Page};
use folio_parser::SyntaxHighlighter;

use super::{SitePaths, load_config};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Runs every document through the pipeline without writing anything. With
/// `files`, only those documents are checked.
pub fn run(config_path: &Path, files: &[PathBuf], strict: bool) -> Result<()> {
    tracing::info!(?config_path, ?files, strict, "Checking configuration and content");

    println!("Checking configuration...");
    let config = load_config(config_path)?;
    println!("  ✓ Configuration valid");

    let paths = SitePaths::resolve(config_path, &config);
    let result = if files.is_empty() {
        println!("\nChecking content in {}...", paths.content.display());
        validate(&config, &paths.content)
    } else {
        println!("\nChecking {} file(s)...", files.len());
        validate_files(&config, &paths.content, files)
    };

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Validate configuration values and every document under `content_dir`.
pub fn validate(config: &Config, content_dir: &Path) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_config_values(config, &mut result);

    let collector = ContentCollector::new(config.clone(), content_dir);
    let content = match collector.collect() {
        Ok(content) => content,
        Err(e) => {
            result.add_error(e.to_string());
            return result;
        }
    };

    for failure in &content.failures {
        result.add_error(format!("{}: {}", failure.path.display(), failure.error));
    }

    for page in &content.pages {
        check_page(page, &mut result);
    }

    println!(
        "  {} {} page(s) valid, {} failed, {} draft(s)",
        if content.failures.is_empty() { "✓" } else { "✗" },
        content.pages.len(),
        content.failures.len(),
        content.drafts
    );

    result
}

/// Validate individual documents.
///
/// The category of each file is the name of its parent directory.
pub fn validate_files(config: &Config, content_dir: &Path, files: &[PathBuf]) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_config_values(config, &mut result);

    let collector = ContentCollector::new(config.clone(), content_dir);
    for file in files {
        let category = file
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        match collector.process_path(category, file) {
            None => result.add_error(format!("{}: not a .md or .mdx file", file.display())),
            Some(Err(e)) => result.add_error(format!("{}: {e}", file.display())),
            Some(Ok(page)) => check_page(&page, &mut result),
        }
    }

    result
}

/// Soft problems in a page that still renders.
fn check_page(page: &Page, result: &mut ValidationResult) {
    let path = page.route.path.display();
    let frontmatter = &page.frontmatter;

    if frontmatter.title.is_none() {
        result.add_warning(format!("{path}: no title, the slug is used instead"));
    }
    if frontmatter.published_at.is_some() && page.date.is_none() {
        result.add_warning(format!(
            "{path}: unreadable publication date {:?}",
            frontmatter.published_at.as_deref().unwrap_or_default()
        ));
    }
    if let Some(theme) = &frontmatter.theme
        && Theme::from_name(theme).is_none()
    {
        result.add_warning(format!("{path}: unknown theme {theme:?}"));
    }
}

/// Check configuration values for common issues.
fn check_config_values(config: &Config, result: &mut ValidationResult) {
    if !config.site.base_url.starts_with("http") {
        result.add_warning("site.base_url should start with http:// or https://");
    }

    let highlighter = SyntaxHighlighter::new(&config.build.syntax_theme);
    if highlighter.theme() != config.build.syntax_theme {
        result.add_warning(format!(
            "unknown syntax theme {:?}, available: {}",
            config.build.syntax_theme,
            highlighter.available_themes().join(", ")
        ));
    }
}
