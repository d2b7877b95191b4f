//! # Page Images To Zip - Entry Point
//!
//! Scarica tutte le immagini caricate da una pagina web e le salva in un zip.
//!
//! ## Flusso di esecuzione:
//! 1. Parsa URL, file di output, timeout e concorrenza
//! 2. Cattura la pagina con `HttpPageCapture`, oppure con Chromium headless (`--browser`)
//! 3. Scrive l'archivio (nessun file se la pagina non ha immagini)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! page-images-to-zip https://example.com/ images.zip --timeout 15000 --concurrency 4
//! page-images-to-zip https://example.com/ images.zip --browser --wait 5
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use web_image_optimizer::archive::{archive_page, HttpPageCapture, PageCapture};

#[derive(Parser)]
#[command(name = "page-images-to-zip")]
#[command(about = "Download every image a web page loads into a zip archive")]
struct Args {
    /// Page URL (http or https)
    url: String,

    /// Zip file to write
    zip_out: PathBuf,

    /// Per-request timeout in milliseconds
    #[arg(short, long, default_value = "30000")]
    timeout: u64,

    /// Maximum number of images fetched at once
    #[arg(short, long, default_value = "8")]
    concurrency: usize,

    /// Load the page in a headless Chromium (scripts run, lazy images load)
    #[arg(long)]
    browser: bool,

    /// Extra seconds to wait after the page loads (browser capture only)
    #[arg(long, default_value = "3.0")]
    wait: f64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(feature = "browser")]
fn browser_capture(timeout: Duration, wait: Duration) -> Result<Box<dyn PageCapture>> {
    Ok(Box::new(
        web_image_optimizer::archive::BrowserPageCapture::new(timeout, wait),
    ))
}

#[cfg(not(feature = "browser"))]
fn browser_capture(_timeout: Duration, _wait: Duration) -> Result<Box<dyn PageCapture>> {
    anyhow::bail!("--browser needs a build with `--features browser`")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let timeout = Duration::from_millis(args.timeout);
    let capture: Box<dyn PageCapture> = if args.browser {
        let wait = Duration::try_from_secs_f64(args.wait)
            .with_context(|| format!("invalid --wait value: {}", args.wait))?;
        browser_capture(timeout, wait)?
    } else {
        Box::new(HttpPageCapture::new(timeout, args.concurrency)?)
    };

    match archive_page(capture.as_ref(), &args.url, &args.zip_out).await? {
        Some(summary) => info!(
            "Saved {} images to {}",
            summary.written(),
            args.zip_out.display()
        ),
        None => info!("No images found; nothing written"),
    }

    Ok(())
}
