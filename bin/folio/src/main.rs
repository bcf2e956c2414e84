//! Folio CLI
//!
//! Static blog generator for Markdown and MDX content.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Folio.
#[derive(Parser)]
#[command(name = "folio", version, about = "A static blog generator for MDX content")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        /// Output directory (defaults to build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include draft entries
        #[arg(long)]
        drafts: bool,
        /// Override site base URL (e.g., https://example.com)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Start development server with live reload
    Watch {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
    /// Create a new draft entry
    New {
        /// Entry to create as <category>/<slug> (e.g., posts/my-article)
        entry: String,
        /// Title (derived from the slug if omitted)
        #[arg(short, long)]
        title: Option<String>,
        /// Write plain Markdown (.md) instead of MDX
        #[arg(long)]
        markdown: bool,
    },
    /// Validate configuration and content
    Check {
        /// Content files to check instead of the whole store
        files: Vec<PathBuf>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    folio::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            drafts,
            base_url,
        } => {
            folio::cmd::build::run(&cli.config, output.as_deref(), drafts, base_url.as_deref())?;
        }
        Commands::Watch { port, open } => {
            folio::cmd::watch::run(&cli.config, port, open).await?;
        }
        Commands::New {
            entry,
            title,
            markdown,
        } => {
            folio::cmd::new::run(&cli.config, &entry, title.as_deref(), markdown)?;
        }
        Commands::Check { files, strict } => {
            folio::cmd::check::run(&cli.config, &files, strict)?;
        }
    }

    Ok(())
}
