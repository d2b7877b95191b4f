//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Parametri di configurazione:
//! - `max_width`: Larghezza massima in pixel (obbligatoria, nessun default)
//! - `quality`: Qualità di encoding 0-100 (obbligatoria, nessun default)
//! - `output_format`: Formato di output (default: webp)
//! - `resize_algorithm`: Filtro di resize (default: lanczos)
//! - `workers`: Numero di worker paralleli (default: 4)
//! - `recursive`: Scansione ricorsiva della directory di input (default: false)
//! - `seo_filenames`: Nomi file SEO-friendly (default: false)
//! - `skip_existing`: Salta file il cui output esiste già (default: false)
//! - `dry_run`: Ottimizza senza scrivere (default: false)
//! - `json_output`: Eventi JSON su stdout (default: false)
//!
//! Larghezza e qualità cambiano da sito a sito (350, 700, 800 px; 80 o 85),
//! quindi vanno sempre fornite dal chiamante.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     workers: 8,
//!     ..Config::new(700, 80)
//! };
//! config.validate()?;
//! ```

use crate::media::{OptimizationRequest, OutputFormat};
use crate::resize::ResizeAlgorithm;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_workers() -> usize {
    4
}

/// Configuration for image optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Encoding quality (0-100)
    pub quality: u8,
    /// Target encoding
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Resampling filter used when downscaling
    #[serde(default)]
    pub resize_algorithm: ResizeAlgorithm,
    /// Number of parallel workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Descend into sub-directories in batch mode
    #[serde(default)]
    pub recursive: bool,
    /// Rewrite output file stems to lower-case, dash-separated names
    #[serde(default)]
    pub seo_filenames: bool,
    /// Skip files whose output already exists
    #[serde(default)]
    pub skip_existing: bool,
    /// Dry run - optimize in memory but don't write anything
    #[serde(default)]
    pub dry_run: bool,
    /// Output progress and status as JSON for programmatic use
    #[serde(default)]
    pub json_output: bool,
}

impl Config {
    /// Configuration with the two caller-supplied values and defaults for everything else
    pub fn new(max_width: u32, quality: u8) -> Self {
        Self {
            max_width,
            quality,
            output_format: OutputFormat::default(),
            resize_algorithm: ResizeAlgorithm::default(),
            workers: default_workers(),
            recursive: false,
            seo_filenames: false,
            skip_existing: false,
            dry_run: false,
            json_output: false,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(anyhow::anyhow!("Max width must be greater than 0"));
        }

        if self.quality > 100 {
            return Err(anyhow::anyhow!("Quality must be between 0 and 100"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        Ok(())
    }

    /// Build the optimization request this configuration describes
    pub fn request(&self) -> Result<OptimizationRequest> {
        Ok(OptimizationRequest::new(
            self.max_width,
            self.quality,
            self.output_format,
        )?)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
