//! Watch command - development server with live reload

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use color_eyre::eyre::{Result, WrapErr};
use folio_generator::{BuildStats, Builder};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use tokio::{net::TcpListener, sync::mpsc};

use super::{SitePaths, build::print_stats, load_config};
use crate::server::{LIVERELOAD_SCRIPT, ReloadMessage, ServerState, create_router};

/// Quiet period after a change before rebuilding.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Run the watch command.
///
/// Builds with drafts, serves the output and rebuilds whenever content,
/// static files or the configuration change.
pub async fn run(config_path: &Path, port: u16, open_browser: bool) -> Result<()> {
    tracing::info!(?config_path, port, "Starting watch mode");

    let config = load_config(config_path)?;
    let paths = SitePaths::resolve(config_path, &config);

    tracing::info!("Running initial build...");
    let stats = rebuild(config_path, &paths)?;
    print_stats(&stats, &paths.output);

    let state = Arc::new(ServerState::new());

    let (tx, mut rx) = mpsc::channel::<Vec<PathBuf>>(64);
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_))
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                )
            {
                let _ = tx.blocking_send(event.paths);
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for dir in [&paths.content, &paths.static_dir] {
        if dir.is_dir() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .wrap_err_with(|| format!("Failed to watch {}", dir.display()))?;
            tracing::debug!(dir = %dir.display(), "Watching directory");
        }
    }
    watcher
        .watch(config_path, RecursiveMode::NonRecursive)
        .wrap_err("Failed to watch configuration file")?;

    let rebuild_state = state.clone();
    let rebuild_config = config_path.to_path_buf();
    let rebuild_paths = paths.clone();

    tokio::spawn(async move {
        while let Some(mut changed) = rx.recv().await {
            tokio::time::sleep(DEBOUNCE).await;
            while let Ok(more) = rx.try_recv() {
                changed.extend(more);
            }

            println!();
            println!("  {} file(s) changed, rebuilding...", changed.len());
            tracing::debug!(?changed, "Change detected");

            let config_path = rebuild_config.clone();
            let paths = rebuild_paths.clone();
            let result = tokio::task::spawn_blocking(move || rebuild(&config_path, &paths)).await;

            match result {
                Ok(Ok(stats)) => {
                    println!(
                        "  ✓ Rebuilt {} pages in {}ms",
                        stats.pages + stats.listings,
                        stats.duration_ms
                    );
                    for path in &stats.failed {
                        println!("  ✗ {}", path.display());
                    }
                    rebuild_state.notify(reload_kind(&changed));
                }
                Ok(Err(e)) => {
                    tracing::error!("Rebuild failed: {e:#}");
                    eprintln!("  ✗ Rebuild failed: {e:#}");
                }
                Err(e) => tracing::error!("Rebuild task panicked: {e}"),
            }
        }
    });

    let app = create_router(&paths.output, state);
    let addr = format!("127.0.0.1:{port}");

    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Dev server running at http://{addr}");
    println!("  Press Ctrl+C to stop");
    println!();

    if open_browser && let Err(e) = open::that(format!("http://{addr}")) {
        tracing::warn!("Could not open browser: {e}");
    }

    // Dropping the watcher stops change notifications.
    let _watcher = watcher;

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}

/// Build the site with drafts and the live reload script, re-reading the config.
fn rebuild(config_path: &Path, paths: &SitePaths) -> Result<BuildStats> {
    let mut config = load_config(config_path)?;
    config.build.drafts = true;

    let stats = Builder::new(config, &paths.content, &paths.output)
        .with_static_dir(&paths.static_dir)
        .with_body_extra(LIVERELOAD_SCRIPT)
        .build()
        .wrap_err("Build failed")?;

    tracing::debug!(?stats, "Build completed");
    Ok(stats)
}

/// Stylesheet-only changes swap CSS in place; anything else reloads the page.
fn reload_kind(changed: &[PathBuf]) -> ReloadMessage {
    let css_only = !changed.is_empty()
        && changed
            .iter()
            .all(|p| p.extension().is_some_and(|ext| ext == "css"));

    if css_only {
        ReloadMessage::CssReload
    } else {
        ReloadMessage::Reload
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_reload_kind() {
        let css = vec![PathBuf::from("static/style.css")];
        let mixed = vec![
            PathBuf::from("static/style.css"),
            PathBuf::from("content/posts/a.mdx"),
        ];

        assert_eq!(reload_kind(&css), ReloadMessage::CssReload);
        assert_eq!(reload_kind(&mixed), ReloadMessage::Reload);
        assert_eq!(reload_kind(&[]), ReloadMessage::Reload);
    }

    #[test]
    fn test_rebuild_injects_livereload() {
        let site = TempDir::new().unwrap();
        let config_path = site.path().join("folio.toml");
        fs::write(
            &config_path,
            "[site]\ntitle = \"Dev\"\nbase_url = \"http://localhost\"\n",
        )
        .unwrap();
        fs::create_dir_all(site.path().join("content/posts")).unwrap();
        fs::create_dir_all(site.path().join("content/sketches")).unwrap();
        fs::write(
            site.path().join("content/posts/wip.mdx"),
            "---\ntitle: WIP\ndraft: true\n---\nSoon.",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        let paths = SitePaths::resolve(&config_path, &config);
        let stats = rebuild(&config_path, &paths).unwrap();

        assert_eq!(stats.pages, 1);
        let html = fs::read_to_string(paths.output.join("posts/wip/index.html")).unwrap();
        assert!(html.contains("/__livereload"));
    }
}
