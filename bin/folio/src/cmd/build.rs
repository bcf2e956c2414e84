//! Build command - generates the static site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use folio_generator::{BuildStats, Builder};

use super::{SitePaths, load_config};

/// Run the build command.
///
/// Documents that fail are listed but do not fail the build; a broken
/// content store or an unwritable output does.
pub fn run(
    config_path: &Path,
    output: Option<&Path>,
    drafts: bool,
    base_url: Option<&str>,
) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, drafts, ?base_url, "Starting build");

    let mut config = load_config(config_path)?;
    config.build.drafts |= drafts;
    if let Some(url) = base_url {
        tracing::info!(base_url = url, "Overriding site base_url from CLI");
        config.site.base_url = url.to_string();
    }

    let mut paths = SitePaths::resolve(config_path, &config);
    if let Some(output) = output {
        paths.output = output.to_path_buf();
    }
    tracing::debug!(?config, ?paths, "Loaded configuration");

    let stats = Builder::new(config, &paths.content, &paths.output)
        .with_static_dir(&paths.static_dir)
        .build()
        .wrap_err("Build failed")?;

    print_stats(&stats, &paths.output);
    tracing::info!(?stats, duration = ?start.elapsed(), "Build completed");

    Ok(())
}

/// Print build statistics and any documents left out.
pub(crate) fn print_stats(stats: &BuildStats, output: &Path) {
    println!();
    println!("  Build completed");
    println!();
    println!("  Pages:      {}", stats.pages);
    println!("  Listings:   {}", stats.listings);
    println!("  Drafts:     {}", stats.drafts);
    println!("  Assets:     {}", stats.assets);
    println!("  Failed:     {}", stats.failed.len());
    println!();
    println!("  Duration:   {}ms", stats.duration_ms);
    println!("  Output:     {}", output.display());
    println!();

    for path in &stats.failed {
        println!("  ✗ {} (run `folio check` for details)", path.display());
    }
    if !stats.failed.is_empty() {
        println!();
    }
}
