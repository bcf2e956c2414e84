//! Folio CLI Library
//!
//! Command implementations and the development server behind the `folio`
//! binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, watch, new, check)
//! - [`server`] - Development server with live reload
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use folio::cmd;
//!
//! cmd::build::run(Path::new("folio.toml"), None, false, None).unwrap();
//! ```

pub mod cmd;
pub mod server;

pub use folio_core::Config;
pub use folio_generator::{BuildStats, Builder, ContentCollector, Page, SiteContent};

/// Initialize tracing with the specified verbosity level.
///
/// `0` shows warnings, `1` info, `2` debug and anything higher trace.
/// `RUST_LOG` directives are honored on top of that.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
