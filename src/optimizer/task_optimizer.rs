//! # Task Optimizer Module
//!
//! Worker per l'ottimizzazione di singoli file.
//! Legge il sorgente, esegue la trasformazione su un thread bloccante,
//! scrive l'output e produce il report del file.

use crate::{
    config::Config,
    error::OptimizeError,
    file_manager::FileManager,
    image_processor::ImageProcessor,
    media::{OptimizationRequest, SourceImage, SourceKind},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Risultato dell'elaborazione di un singolo file
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub original_size: u64,
    pub optimized_size: u64,
    pub original_dimensions: Option<(u32, u32)>,
    pub final_dimensions: Option<(u32, u32)>,
    /// Output already existed and `skip_existing` was set
    pub skipped: bool,
}

impl FileOutcome {
    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_size, self.optimized_size)
    }
}

/// Worker per elaborazione singoli file
#[derive(Clone)]
pub struct TaskOptimizer {
    config: Config,
    request: OptimizationRequest,
    processor: ImageProcessor,
}

impl TaskOptimizer {
    pub fn new(config: Config, request: OptimizationRequest, processor: ImageProcessor) -> Self {
        Self {
            config,
            request,
            processor,
        }
    }

    /// Processa un singolo file. Nessun output viene scritto se un passo fallisce.
    pub async fn process_single_file(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<FileOutcome, OptimizeError> {
        if !input_path.exists() {
            return Err(OptimizeError::InputNotFound(input_path.to_path_buf()));
        }

        if self.config.skip_existing && output_path.exists() {
            debug!(
                "[SKIP] Output already exists: {} -> {}",
                input_path.display(),
                output_path.display()
            );
            return Ok(FileOutcome {
                input_path: input_path.to_path_buf(),
                output_path: output_path.to_path_buf(),
                original_size: 0,
                optimized_size: 0,
                original_dimensions: None,
                final_dimensions: None,
                skipped: true,
            });
        }

        let source = SourceImage::load(input_path).await?;
        let original_size = source.len();
        let original_dimensions = source_dimensions(&source);
        debug!(
            "Loaded {} ({}, {})",
            input_path.display(),
            source.kind().name(),
            FileManager::format_size(original_size)
        );

        let processor = self.processor.clone();
        let request = self.request;
        let optimized = tokio::task::spawn_blocking(move || processor.optimize(&source, &request))
            .await
            .map_err(|e| std::io::Error::other(format!("optimization worker failed: {}", e)))??;

        if self.config.dry_run {
            debug!("Dry run: would write {}", output_path.display());
        } else {
            FileManager::write_output(output_path, &optimized.bytes).await?;
        }

        let outcome = FileOutcome {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            original_size,
            optimized_size: optimized.byte_size(),
            original_dimensions,
            final_dimensions: Some((optimized.width, optimized.height)),
            skipped: false,
        };
        log_outcome(&outcome);
        Ok(outcome)
    }
}

/// Dimensions of a raster source without decoding pixels
fn source_dimensions(source: &SourceImage) -> Option<(u32, u32)> {
    match source.kind() {
        SourceKind::Raster(format) => {
            image::ImageReader::with_format(std::io::Cursor::new(source.bytes()), format.to_image_format())
                .into_dimensions()
                .ok()
        }
        SourceKind::Vector => None,
    }
}

fn log_outcome(outcome: &FileOutcome) {
    let name = outcome
        .input_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy();

    let dimensions = match (outcome.original_dimensions, outcome.final_dimensions) {
        (Some((w, h)), Some((nw, nh))) if (w, h) != (nw, nh) => {
            format!("{}x{} → {}x{}", w, h, nw, nh)
        }
        (_, Some((nw, nh))) => format!("{}x{}", nw, nh),
        _ => String::new(),
    };

    info!(
        "[+] {} → {} [{}]: {} → {} (saved {:.1}%)",
        name,
        outcome.output_path.display(),
        dimensions,
        FileManager::format_size(outcome.original_size),
        FileManager::format_size(outcome.optimized_size),
        outcome.reduction_percent()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::OutputFormat;
    use crate::resize::ImageResizer;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use tempfile::TempDir;

    fn task(config: Config) -> TaskOptimizer {
        let request = config.request().unwrap();
        TaskOptimizer::new(config, request, ImageProcessor::new(ImageResizer::default(), None))
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 40, 255])
        });
        DynamicImage::ImageRgba8(image)
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    #[tokio::test]
    async fn test_process_file_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("wide.png");
        let output = dir.path().join("out/wide.webp");
        write_png(&input, 1000, 500);

        let outcome = task(Config::new(350, 85))
            .process_single_file(&input, &output)
            .await
            .unwrap();

        assert!(!outcome.skipped);
        assert_eq!(outcome.original_dimensions, Some((1000, 500)));
        assert_eq!(outcome.final_dimensions, Some((350, 175)));
        assert_eq!(std::fs::metadata(&output).unwrap().len(), outcome.optimized_size);
        let decoded = image::open(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (350, 175));
    }

    #[tokio::test]
    async fn test_unsupported_extension_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("legacy.bmp");
        std::fs::write(&input, b"BM....").unwrap();
        let output = dir.path().join("legacy.webp");

        let result = task(Config::new(350, 85)).process_single_file(&input, &output).await;

        assert!(matches!(result, Err(OptimizeError::UnsupportedFormat(_))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let result = task(Config::new(350, 85))
            .process_single_file(&dir.path().join("nope.png"), &dir.path().join("nope.webp"))
            .await;
        assert!(matches!(result, Err(OptimizeError::InputNotFound(_))));
    }

    #[tokio::test]
    async fn test_svg_without_rasterizer_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("logo.svg");
        std::fs::write(&input, r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#).unwrap();
        let output = dir.path().join("logo.webp");

        let result = task(Config::new(350, 85)).process_single_file(&input, &output).await;

        assert!(matches!(result, Err(OptimizeError::VectorRasterizationUnavailable)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.png");
        let output = dir.path().join("a.jpg");
        write_png(&input, 64, 64);

        let config = Config {
            dry_run: true,
            output_format: OutputFormat::Jpeg,
            ..Config::new(32, 80)
        };
        let outcome = task(config).process_single_file(&input, &output).await.unwrap();

        assert_eq!(outcome.final_dimensions, Some((32, 32)));
        assert!(outcome.optimized_size > 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_skip_existing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.png");
        let output = dir.path().join("a.webp");
        write_png(&input, 16, 16);
        std::fs::write(&output, b"previous").unwrap();

        let config = Config {
            skip_existing: true,
            ..Config::new(350, 85)
        };
        let outcome = task(config).process_single_file(&input, &output).await.unwrap();

        assert!(outcome.skipped);
        assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    }
}
