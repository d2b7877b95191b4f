//! # Web Image Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'ottimizzatore di immagini.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Unione di file di configurazione e flag CLI (la CLI vince)
//! - Scelta della modalità: file singolo o directory
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Configura il logging (`RUST_LOG`, altrimenti INFO o DEBUG con `--verbose`)
//! 3. Costruisce e valida la `Config`
//! 4. Istanzia `BatchOptimizer` con le capacità disponibili (SVG se compilato)
//! 5. Esce con errore se almeno un file è fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! image-optimizer ./photos ./public/img --max-width 700 --quality 80 --seo-names
//! image-optimizer hero.png public/hero.webp --max-width 1200 --quality 85
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use web_image_optimizer::json_output::JsonMessage;
use web_image_optimizer::{BatchOptimizer, Config, ImageProcessor, OutputFormat, ResizeAlgorithm};

#[derive(Parser)]
#[command(name = "image-optimizer")]
#[command(about = "Resize and re-encode images for the web")]
struct Args {
    /// Input image file or directory
    input: PathBuf,

    /// Output file (single image) or directory (batch)
    output: PathBuf,

    /// Maximum output width in pixels (never upscales)
    #[arg(short = 'W', long)]
    max_width: Option<u32>,

    /// Encoding quality (0-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Resampling filter used when downscaling
    #[arg(long, value_enum)]
    filter: Option<ResizeAlgorithm>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Scan sub-directories and mirror their structure in the output
    #[arg(short, long)]
    recursive: bool,

    /// Lower-case, dash-separated output file names
    #[arg(long)]
    seo_names: bool,

    /// Skip files whose output already exists
    #[arg(long)]
    skip_existing: bool,

    /// Optimize in memory and report, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Output progress as JSON lines for programmatic use
    #[arg(long)]
    json: bool,

    /// JSON configuration file (CLI flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Configuration file values overridden by whatever was given on the command line
    async fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = Config::from_file(path).await?;
                if let Some(width) = self.max_width {
                    config.max_width = width;
                }
                if let Some(quality) = self.quality {
                    config.quality = quality;
                }
                config
            }
            None => {
                let max_width = self
                    .max_width
                    .context("--max-width is required (or set max_width in a --config file)")?;
                let quality = self
                    .quality
                    .context("--quality is required (or set quality in a --config file)")?;
                Config::new(max_width, quality)
            }
        };

        if let Some(format) = self.format {
            config.output_format = format;
        }
        if let Some(filter) = self.filter {
            config.resize_algorithm = filter;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.recursive |= self.recursive;
        config.seo_filenames |= self.seo_names;
        config.skip_existing |= self.skip_existing;
        config.dry_run |= self.dry_run;
        config.json_output |= self.json;

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Args) -> Result<()> {
    let config = args.to_config().await?;
    let processor = ImageProcessor::with_default_capabilities(config.resize_algorithm);
    if !processor.supports_vector() {
        info!("Built without SVG support; vector inputs will be rejected");
    }

    let optimizer = BatchOptimizer::new(config, processor)?;

    if args.input.is_dir() {
        let stats = optimizer.run_directory(&args.input, &args.output).await?;
        if stats.errors > 0 {
            anyhow::bail!("{} of {} files failed", stats.errors, stats.files_processed);
        }
    } else {
        optimizer.run_single(&args.input, &args.output).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = run(&args).await;
    if let Err(e) = &result {
        if args.json {
            JsonMessage::error(e.to_string(), Some(format!("{:#}", e))).emit();
        }
    }
    result
}
