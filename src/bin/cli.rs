//! Graph Crawler CLI
//!
//! Local execution entry point for album resolution, crawling and image
//! post-processing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use graph_crawler::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    utils::{fs::read_url_list, http, log::step, url::filter_platform_urls},
};

/// Platform article album crawler
#[derive(Parser, Debug)]
#[command(
    name = "graph-crawler",
    version,
    about = "Crawl platform article albums into offline snapshots"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an album into its article list
    Album {
        /// Album landing page URL
        url: String,

        /// Crawl every resolved article afterwards
        #[arg(long)]
        crawl: bool,

        /// Output directory for the crawl (default: output.save_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Crawl article URLs
    Crawl {
        /// File with one article URL per line
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Article URLs
        urls: Vec<String>,

        /// Output directory (default: output.save_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Crop a strip off the bottom of every image in a directory tree
    Crop {
        /// Directory to process (default: output.save_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Pixels to remove (default: postprocess.crop_bottom_pixels)
        #[arg(short, long)]
        bottom: Option<u32>,
    },

    /// Shuffle image names and split large image directories
    Shuffle {
        /// Directory to process (default: output.save_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Split threshold (default: postprocess.shuffle_max_images)
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging.
///
/// Without `RUST_LOG` the logger lets every record through and the level is
/// narrowed with [`log::set_max_level`] once the config is loaded, so a config
/// load warning is still reported.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format_timestamp_secs()
        .init();
}

/// Effective level: `--verbose` wins, then `RUST_LOG`, then `[logging] level`.
fn level_filter(verbose: bool, configured: &str) -> log::LevelFilter {
    if verbose {
        return log::LevelFilter::Debug;
    }
    if std::env::var_os("RUST_LOG").is_some() {
        return log::max_level();
    }
    configured.parse().unwrap_or(log::LevelFilter::Info)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = Config::load_or_default(&cli.config);
    log::set_max_level(level_filter(cli.verbose, &config.logging.level));

    log::info!("Graph Crawler starting...");

    match cli.command {
        Command::Album { url, crawl, output } => {
            let total = if crawl { 2 } else { 1 };
            let client = http::create_async_client(&config.crawler)?;
            step(1, total, "Resolving album listing");
            let listing = pipeline::run_album(&config, &client, &url).await?;

            if crawl {
                step(2, total, "Crawling resolved articles");
                let output = output.unwrap_or_else(|| config.output.save_dir.clone());
                pipeline::run_crawler(&config, &client, &listing.urls(), &output).await?;
            }
        }

        Command::Crawl { input, urls, output } => {
            let mut targets = Vec::new();
            if let Some(input) = input {
                targets.extend(read_url_list(&input, &config.crawler.platform_domain)?);
            }
            targets.extend(filter_platform_urls(urls, &config.crawler.platform_domain));
            if targets.is_empty() {
                return Err(AppError::config("No article URLs given; pass URLs or --input"));
            }

            let output = output.unwrap_or_else(|| config.output.save_dir.clone());
            let client = http::create_async_client(&config.crawler)?;
            pipeline::run_crawler(&config, &client, &targets, &output).await?;
        }

        Command::Crop { dir, bottom } => {
            let dir = dir.unwrap_or_else(|| config.output.save_dir.clone());
            pipeline::run_crop(&config, &dir, bottom).await?;
        }

        Command::Shuffle { dir, max } => {
            let dir = dir.unwrap_or_else(|| config.output.save_dir.clone());
            pipeline::run_shuffle(&config, &dir, max).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({})", cli.config.display());
        }
    }

    log::info!("Done!");

    Ok(())
}
