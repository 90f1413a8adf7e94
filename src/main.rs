//! shopping-mission CLI
//!
//! Pick a budget, shop from a CSV catalog, and justify the cart as a PNG.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use humansize::{format_size, BINARY};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use shopping_mission::catalog::{load_catalog, Catalog, CatalogError};
use shopping_mission::images::{probe_catalog, ImageProber};
use shopping_mission::render::{ResultRenderer, SystemFontRenderer, PNG_MIME};
use shopping_mission::report::{format_catalog, format_won};
use shopping_mission::session::{validate_reason, Session};
use shopping_mission::tui;
use shopping_mission::types::{CartItem, MissionConfig, OutputFormat, ProductImage, DEFAULT_CATALOG};

#[derive(Parser)]
#[command(name = "shopping-mission")]
#[command(about = "Pick a budget, fill a cart, and explain why")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    play: PlayArgs,
}

#[derive(Args, Clone)]
struct PlayArgs {
    /// Product catalog (CSV with name,price,image_url)
    #[arg(long, default_value = DEFAULT_CATALOG)]
    catalog: PathBuf,

    /// Font used for the result image (default: discover a system font)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write logs to this file while the TUI is running
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl From<PlayArgs> for MissionConfig {
    fn from(args: PlayArgs) -> Self {
        MissionConfig {
            catalog_path: args.catalog,
            font_path: args.font,
            log_file: args.log_file,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive mission (default)
    Play(PlayArgs),

    /// List the catalog without starting the TUI
    Catalog {
        /// Product catalog (CSV with name,price,image_url)
        #[arg(long, default_value = DEFAULT_CATALOG)]
        catalog: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Probe every product image and report its status
        #[arg(long)]
        check_images: bool,
    },

    /// Render a result image from a cart file, no TUI
    Render {
        /// JSON array of {"name", "price"} cart items
        #[arg(long)]
        cart: PathBuf,

        /// Why these items were bought
        #[arg(long)]
        reason: String,

        /// Font used for the result image (default: discover a system font)
        #[arg(long)]
        font: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => cmd_play(cli.play.into()),
        Some(Commands::Play(args)) => cmd_play(args.into()),
        Some(Commands::Catalog { catalog, format, check_images }) => {
            cmd_catalog(&catalog, format.into(), check_images)
        }
        Some(Commands::Render { cart, reason, font }) => cmd_render(&cart, &reason, font),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

/// Log sink for a command.
enum LogTarget<'a> {
    /// Nothing is installed; the TUI owns the terminal.
    Off,
    Stderr,
    File(&'a Path),
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
fn init_tracing(target: LogTarget<'_>) -> Result<(), String> {
    match target {
        LogTarget::Off => {}
        LogTarget::Stderr => {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }
    Ok(())
}

// ============================================================================
// PROGRESS HELPERS
// ============================================================================

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message(msg.to_string());
    pb
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn cmd_play(config: MissionConfig) -> Result<(), String> {
    let target = match &config.log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Off,
    };
    init_tracing(target)?;

    let pb = spinner("Loading catalog...");
    let catalog = load_catalog(&config.catalog_path);
    pb.finish_and_clear();
    let catalog = catalog.map_err(|e| describe_catalog_error(&e))?;

    let images = probe_with_progress(&catalog);
    let session = Session::new(catalog, images);
    let renderer = SystemFontRenderer::new(config.font_path);

    tracing::info!(catalog = %config.catalog_path.display(), "mission started");
    tui::run(session, &renderer).map_err(|e| format!("terminal error: {}", e))?;
    tracing::info!("mission ended");
    Ok(())
}

fn cmd_catalog(path: &Path, format: OutputFormat, check_images: bool) -> Result<(), String> {
    init_tracing(LogTarget::Stderr)?;

    let catalog = load_catalog(path).map_err(|e| describe_catalog_error(&e))?;

    let images = if !check_images {
        None
    } else if format == OutputFormat::Human {
        Some(probe_with_progress(&catalog))
    } else {
        Some(probe_catalog(&catalog))
    };

    print!("{}", format_catalog(&catalog, images.as_deref(), format));
    Ok(())
}

fn cmd_render(cart_path: &Path, reason: &str, font: Option<PathBuf>) -> Result<(), String> {
    init_tracing(LogTarget::Stderr)?;

    validate_reason(reason).map_err(|e| e.to_string())?;

    let raw = fs::read_to_string(cart_path)
        .map_err(|e| format!("cannot read cart {}: {}", cart_path.display(), e))?;
    let items: Vec<CartItem> = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid cart {}: {}", cart_path.display(), e))?;

    let renderer = SystemFontRenderer::new(font);
    let path = renderer.render(reason, &items).map_err(|e| e.to_string())?;

    let size = fs::metadata(&path)
        .map(|m| m.len())
        .map_err(|e| format!("cannot read written image {}: {}", path.display(), e))?;
    let total: u64 = items.iter().map(|item| item.price).sum();
    eprintln!(
        "{} items, total {} ({}, {})",
        items.len(),
        format_won(total),
        format_size(size, BINARY),
        PNG_MIME
    );
    println!("결과가 {}에 저장되었습니다!", path.display());
    Ok(())
}

// ============================================================================
// CATALOG HELPERS
// ============================================================================

fn describe_catalog_error(e: &CatalogError) -> String {
    match e {
        CatalogError::Open { path, .. } => {
            format!("❌ {} 파일을 찾을 수 없습니다. ({})", path.display(), e)
        }
        CatalogError::Parse { .. } => e.to_string(),
    }
}

/// Probe product images in parallel with a progress bar.
fn probe_with_progress(catalog: &Catalog) -> Vec<ProductImage> {
    let prober = ImageProber::new(&catalog.base_dir);
    let pb = progress_bar(catalog.len() as u64, "Checking images...");

    let images: Vec<_> = catalog
        .products
        .par_iter()
        .progress_with(pb.clone())
        .map(|product| prober.probe(&product.image_url))
        .collect();

    pb.finish_and_clear();
    images
}
