//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore dell'ottimizzatore di immagini.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError`, l'insieme chiuso dei fallimenti per singola immagine
//! - Fornisce messaggi di errore descrittivi che identificano file e causa
//! - Integra con `thiserror` per conversione automatica degli errori I/O
//!
//! ## Categorie di errori:
//! - `InputNotFound`: File di input inesistente
//! - `UnsupportedFormat`: Estensione o contenuto non supportato
//! - `Decode`: Byte non decodificabili nel formato dichiarato
//! - `VectorRasterizationUnavailable`: Input SVG senza capacità di rasterizzazione
//! - `Encode`: L'encoder non produce byte di output
//! - `OutputWrite`: Scrittura del file di output fallita
//! - `InvalidRequest`: Parametri di ottimizzazione non validi
//! - `Io`: Altri errori di lettura
//!
//! `ArchiveError` copre invece il downloader di pagine:
//! URL non valido, errori HTTP, errori del browser headless, errori zip e I/O.
//!
//! ## Esempio:
//! ```rust,ignore
//! if !path.exists() {
//!     return Err(OptimizeError::InputNotFound(path.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unsupported file format: {0} (supported: png, jpg, jpeg, webp, svg)")]
    UnsupportedFormat(String),

    #[error("Failed to decode {format} image: {reason}")]
    Decode { format: String, reason: String },

    #[error("SVG input requires vector rasterization support; rebuild with `--features svg` to enable it")]
    VectorRasterizationUnavailable,

    #[error("Failed to encode {format} output: {reason}")]
    Encode { format: String, reason: String },

    #[error("Failed to write output {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid optimization request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OptimizeError {
    pub(crate) fn decode(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode {
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors of the page image archiver
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser capture failed: {0}")]
    Browser(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
