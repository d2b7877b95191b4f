//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso da altri programmi.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio processo di ottimizzazione
//! - `file_complete`: Fine elaborazione di un file (ottimizzato, saltato o in errore)
//! - `complete`: Fine processo con statistiche finali
//! - `error`: Errore fatale
//!
//! Un oggetto JSON per riga su stdout.

use crate::media::OutputFormat;
use crate::progress::OptimizationStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del processo di ottimizzazione
    Start {
        input: PathBuf,
        output: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    /// Fine elaborazione di un file specifico
    FileComplete {
        path: PathBuf,
        output_path: Option<PathBuf>,
        original_size: u64,
        optimized_size: u64,
        width: Option<u32>,
        height: Option<u32>,
        reduction_percent: f64,
        skipped: bool,
        error: Option<String>,
    },

    /// Processo completato
    Complete {
        files_processed: usize,
        files_optimized: usize,
        files_skipped: usize,
        errors: usize,
        total_original_size: u64,
        total_optimized_size: u64,
        average_reduction: f64,
        duration_seconds: f64,
    },

    /// Errore generale
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub max_width: u32,
    pub quality: u8,
    pub output_format: OutputFormat,
    pub workers: usize,
    pub dry_run: bool,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Crea un messaggio di completamento generale
    pub fn complete(stats: &OptimizationStats, duration_seconds: f64) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_optimized: stats.files_optimized,
            files_skipped: stats.files_skipped,
            errors: stats.errors,
            total_original_size: stats.total_original_size,
            total_optimized_size: stats.total_optimized_size,
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds,
        }
    }

    /// Crea un messaggio di errore
    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

/// Converti Config in JsonConfig
impl From<&crate::Config> for JsonConfig {
    fn from(config: &crate::Config) -> Self {
        Self {
            max_width: config.max_width,
            quality: config.quality,
            output_format: config.output_format,
            workers: config.workers,
            dry_run: config.dry_run,
        }
    }
}
