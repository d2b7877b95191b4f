//! # Media Types Module
//!
//! Tipi di dato scambiati con l'ottimizzatore.
//!
//! ## Strutture dati:
//! - `SourceImage`: byte originali + tipo (`SourceKind`) deciso una sola volta al caricamento
//! - `OptimizationRequest`: larghezza massima, qualità e formato di output, validati alla costruzione
//! - `OptimizedImage`: byte codificati con dimensioni finali
//!
//! ## Rilevamento formato:
//! 1. L'estensione dichiarata deve essere tra `png`, `jpg`, `jpeg`, `webp`, `svg`
//! 2. Il contenuto viene analizzato (magic bytes / markup SVG)
//! 3. Se l'analisi non è conclusiva si usa l'estensione dichiarata

use crate::error::OptimizeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions accepted as optimizer input (lower-case).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg"];

/// Raster formats the decoder is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    WebP,
}

impl RasterFormat {
    pub fn name(&self) -> &'static str {
        match self {
            RasterFormat::Png => "PNG",
            RasterFormat::Jpeg => "JPEG",
            RasterFormat::WebP => "WebP",
        }
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            RasterFormat::Png => image::ImageFormat::Png,
            RasterFormat::Jpeg => image::ImageFormat::Jpeg,
            RasterFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

/// What kind of source we hold, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Raster(RasterFormat),
    Vector,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Raster(format) => format.name(),
            SourceKind::Vector => "SVG",
        }
    }
}

/// Source image bytes and their detected kind
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Vec<u8>,
    kind: SourceKind,
}

impl SourceImage {
    /// Build a source from raw bytes and the extension the caller declared for them.
    pub fn from_bytes(bytes: Vec<u8>, declared_extension: &str) -> Result<Self, OptimizeError> {
        let ext = declared_extension.trim_start_matches('.').to_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(OptimizeError::UnsupportedFormat(format!(".{}", ext)));
        }

        let kind = match sniff_kind(&bytes)? {
            Some(kind) => kind,
            None => kind_from_extension(&ext),
        };

        Ok(Self { bytes, kind })
    }

    /// Read a source from disk. The extension is validated before any byte is read.
    pub async fn load(path: &Path) -> Result<Self, OptimizeError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(OptimizeError::UnsupportedFormat(path.display().to_string()));
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OptimizeError::InputNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        Self::from_bytes(bytes, &ext)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Detect the kind from content. `Ok(None)` means the bytes were not recognized.
fn sniff_kind(bytes: &[u8]) -> Result<Option<SourceKind>, OptimizeError> {
    if looks_like_svg(bytes) {
        return Ok(Some(SourceKind::Vector));
    }

    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => Ok(Some(SourceKind::Raster(RasterFormat::Png))),
        Ok(image::ImageFormat::Jpeg) => Ok(Some(SourceKind::Raster(RasterFormat::Jpeg))),
        Ok(image::ImageFormat::WebP) => Ok(Some(SourceKind::Raster(RasterFormat::WebP))),
        Ok(other) => Err(OptimizeError::UnsupportedFormat(format!(
            "{:?} content",
            other
        ))),
        Err(_) => Ok(None),
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with('<') && text.contains("<svg"))
}

fn kind_from_extension(ext: &str) -> SourceKind {
    match ext {
        "svg" => SourceKind::Vector,
        "jpg" | "jpeg" => SourceKind::Raster(RasterFormat::Jpeg),
        "webp" => SourceKind::Raster(RasterFormat::WebP),
        _ => SourceKind::Raster(RasterFormat::Png),
    }
}

/// Target encoding for optimized output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy WebP, alpha preserved
    #[value(name = "webp")]
    WebP,
    /// Baseline JPEG, alpha flattened over white
    Jpeg,
}

impl OutputFormat {
    /// Canonical file extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "WebP",
            OutputFormat::Jpeg => "JPEG",
        }
    }

    pub fn supports_alpha(&self) -> bool {
        matches!(self, OutputFormat::WebP)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::WebP
    }
}

/// Caller-supplied target constraints. Only valid requests can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationRequest {
    max_width: u32,
    quality: u8,
    output_format: OutputFormat,
}

impl OptimizationRequest {
    pub fn new(
        max_width: u32,
        quality: u8,
        output_format: OutputFormat,
    ) -> Result<Self, OptimizeError> {
        if max_width == 0 {
            return Err(OptimizeError::InvalidRequest(
                "max width must be a positive integer".to_string(),
            ));
        }
        if quality > 100 {
            return Err(OptimizeError::InvalidRequest(format!(
                "quality must be between 0 and 100, got {}",
                quality
            )));
        }

        Ok(Self {
            max_width,
            quality,
            output_format,
        })
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}

/// Encoded output of a single optimization
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl OptimizedImage {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SourceImage::from_bytes(png_bytes(), "bmp");
        assert!(matches!(result, Err(OptimizeError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_content_wins_over_extension() {
        let source = SourceImage::from_bytes(png_bytes(), ".JPG").unwrap();
        assert_eq!(source.kind(), SourceKind::Raster(RasterFormat::Png));
    }

    #[test]
    fn test_svg_sniffing() {
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
        let source = SourceImage::from_bytes(svg.to_vec(), "svg").unwrap();
        assert_eq!(source.kind(), SourceKind::Vector);
    }

    #[test]
    fn test_unknown_content_falls_back_to_extension() {
        let source = SourceImage::from_bytes(b"garbage".to_vec(), "webp").unwrap();
        assert_eq!(source.kind(), SourceKind::Raster(RasterFormat::WebP));
    }

    #[test]
    fn test_request_validation() {
        assert!(OptimizationRequest::new(350, 85, OutputFormat::WebP).is_ok());
        assert!(OptimizationRequest::new(350, 0, OutputFormat::WebP).is_ok());
        assert!(matches!(
            OptimizationRequest::new(0, 85, OutputFormat::WebP),
            Err(OptimizeError::InvalidRequest(_))
        ));
        assert!(matches!(
            OptimizationRequest::new(350, 101, OutputFormat::Jpeg),
            Err(OptimizeError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = SourceImage::load(&dir.path().join("missing.png")).await;
        assert!(matches!(result, Err(OptimizeError::InputNotFound(_))));
    }

    #[test]
    fn test_output_extension() {
        assert_eq!(OutputFormat::WebP.extension(), "webp");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert!(OutputFormat::WebP.supports_alpha());
        assert!(!OutputFormat::Jpeg.supports_alpha());
    }
}
