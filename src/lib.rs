//! # Web Image Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita ai due binari (`image-optimizer`, `page-images-to-zip`)
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore per ottimizzazione e archiviazione
//! - `media`: Immagine sorgente, richiesta di ottimizzazione, formati
//! - `resize`: Calcolo dimensioni e resampling
//! - `rasterize`: Capacità opzionale di rasterizzazione SVG
//! - `image_processor`: Pipeline decode → resize → encode
//! - `file_manager`: Operazioni sui file e discovery immagini
//! - `optimizer`: Driver batch (file singolo / directory)
//! - `progress`: Progress bar e statistiche
//! - `json_output`: Eventi JSON per uso programmatico
//! - `archive`: Download delle immagini di una pagina in un file zip
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use web_image_optimizer::{BatchOptimizer, Config, ImageProcessor};
//!
//! let config = Config::new(700, 80);
//! let processor = ImageProcessor::with_default_capabilities(config.resize_algorithm);
//! let optimizer = BatchOptimizer::new(config, processor)?;
//! optimizer.run_directory(&input, &output).await?;
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod json_output;
pub mod media;
pub mod optimizer;
pub mod progress;
pub mod rasterize;
pub mod resize;

pub use config::Config;
pub use error::{ArchiveError, OptimizeError};
pub use image_processor::ImageProcessor;
pub use media::{OptimizationRequest, OptimizedImage, OutputFormat, SourceImage, SourceKind};
pub use optimizer::BatchOptimizer;
pub use resize::ResizeAlgorithm;
