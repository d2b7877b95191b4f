//! # Image Processing Module
//!
//! Questo modulo contiene il cuore dell'ottimizzazione: una trasformazione pura,
//! in memoria, da `SourceImage` a `OptimizedImage`.
//!
//! ## Pipeline di Ottimizzazione
//!
//! 1. **Vettoriale (SVG)**: rasterizzazione direttamente alla larghezza massima,
//!    nessun resize successivo. Senza `Rasterizer` configurato l'operazione fallisce
//!    con `VectorRasterizationUnavailable`.
//! 2. **Raster**: decodifica; se più larga di `max_width` resize Lanczos3 con
//!    altezza proporzionale, altrimenti nessuna modifica.
//! 3. **Normalizzazione colore**: immagini con alpha o palette → RGBA8,
//!    tutte le altre → RGB8.
//! 4. **Encoding**: WebP con libwebp al metodo 6 (il più lento, massima riduzione)
//!    oppure JPEG baseline, sempre alla qualità richiesta.
//!
//! ## Formati Supportati
//!
//! | Formato | Input | Output | Libreria |
//! |---------|-------|--------|----------|
//! | PNG     | ✅    | ❌     | image |
//! | JPEG    | ✅    | ✅     | image |
//! | WebP    | ✅    | ✅     | image (decode), libwebp (encode) |
//! | SVG     | ✅    | ❌     | resvg (feature `svg`) |
//!
//! Nessun accesso a filesystem o rete: lettura e scrittura sono compito
//! del chiamante (`optimizer::TaskOptimizer`). Nessun retry: un errore in
//! qualunque passo interrompe l'ottimizzazione di quell'immagine.

use crate::error::OptimizeError;
use crate::media::{
    OptimizationRequest, OptimizedImage, OutputFormat, RasterFormat, SourceImage, SourceKind,
};
use crate::rasterize::{default_rasterizer, Rasterizer};
use crate::resize::{ImageResizer, ResizeAlgorithm};
use image::{DynamicImage, RgbImage, RgbaImage};
use std::sync::Arc;
use tracing::debug;

/// libwebp effort level: 0 = fastest, 6 = slowest and smallest.
const WEBP_METHOD: i32 = 6;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
/// IHDR colour type for palette images
const PNG_COLOR_TYPE_INDEXED: u8 = 3;

/// Whether a PNG stream is palette based. Signature, IHDR length and tag, width,
/// height and bit depth come first, so the colour type sits at byte 25.
fn is_indexed_png(bytes: &[u8]) -> bool {
    bytes.len() > 25
        && bytes.starts_with(PNG_SIGNATURE)
        && &bytes[12..16] == b"IHDR"
        && bytes[25] == PNG_COLOR_TYPE_INDEXED
}

/// Pixel buffer after color normalization
enum NormalizedPixels {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl NormalizedPixels {
    /// `indexed` marks palette sources, which the decoder has already expanded
    fn from_image(image: DynamicImage, indexed: bool) -> Self {
        if indexed || image.color().has_alpha() {
            Self::Rgba(image.into_rgba8())
        } else {
            Self::Rgb(image.into_rgb8())
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Rgb(image) => image.dimensions(),
            Self::Rgba(image) => image.dimensions(),
        }
    }
}

/// Ottimizzatore di singole immagini
#[derive(Clone)]
pub struct ImageProcessor {
    resizer: ImageResizer,
    rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl ImageProcessor {
    /// Creates a processor with an explicit vector rasterization capability (or none).
    pub fn new(resizer: ImageResizer, rasterizer: Option<Arc<dyn Rasterizer>>) -> Self {
        Self {
            resizer,
            rasterizer,
        }
    }

    /// Creates a processor with whatever rasterizer this build provides.
    pub fn with_default_capabilities(algorithm: ResizeAlgorithm) -> Self {
        Self::new(ImageResizer::new(algorithm), default_rasterizer())
    }

    /// Whether SVG input can be processed
    pub fn supports_vector(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Optimizes a single image according to `request`.
    ///
    /// # Errors
    /// - `VectorRasterizationUnavailable` for SVG input without a rasterizer
    /// - `Decode` when the bytes are not a valid image of their detected format
    /// - `Encode` when the target encoder cannot produce output
    ///
    /// # Example
    /// ```rust,ignore
    /// let processor = ImageProcessor::with_default_capabilities(ResizeAlgorithm::Lanczos);
    /// let request = OptimizationRequest::new(350, 85, OutputFormat::WebP)?;
    /// let optimized = processor.optimize(&source, &request)?;
    /// ```
    pub fn optimize(
        &self,
        source: &SourceImage,
        request: &OptimizationRequest,
    ) -> Result<OptimizedImage, OptimizeError> {
        let (image, indexed) = match source.kind() {
            SourceKind::Vector => {
                let rasterizer = self
                    .rasterizer
                    .as_ref()
                    .ok_or(OptimizeError::VectorRasterizationUnavailable)?;
                debug!("Converting SVG with {}", rasterizer.name());
                let raster = rasterizer.rasterize(source.bytes(), request.max_width())?;
                (DynamicImage::ImageRgba8(raster), false)
            }
            SourceKind::Raster(format) => {
                let decoded =
                    image::load_from_memory_with_format(source.bytes(), format.to_image_format())
                        .map_err(|e| OptimizeError::decode(format.name(), e))?;
                debug!(
                    "Decoded {} {}x{} ({:?})",
                    format.name(),
                    decoded.width(),
                    decoded.height(),
                    decoded.color()
                );
                let indexed = format == RasterFormat::Png && is_indexed_png(source.bytes());
                (self.resizer.fit_width(decoded, request.max_width()), indexed)
            }
        };

        let pixels = NormalizedPixels::from_image(image, indexed);
        let (width, height) = pixels.dimensions();
        let bytes = encode(pixels, request.output_format(), request.quality())?;

        Ok(OptimizedImage {
            bytes,
            width,
            height,
            format: request.output_format(),
        })
    }
}

fn encode(
    pixels: NormalizedPixels,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, OptimizeError> {
    match format {
        OutputFormat::WebP => encode_webp(&pixels, quality),
        OutputFormat::Jpeg => {
            let rgb = match pixels {
                NormalizedPixels::Rgb(image) => image,
                NormalizedPixels::Rgba(image) => flatten_on_white(&image),
            };
            encode_jpeg(&rgb, quality)
        }
    }
}

fn encode_webp(pixels: &NormalizedPixels, quality: u8) -> Result<Vec<u8>, OptimizeError> {
    let (width, height) = pixels.dimensions();
    let encoder = match pixels {
        NormalizedPixels::Rgb(image) => webp::Encoder::from_rgb(image.as_raw(), width, height),
        NormalizedPixels::Rgba(image) => webp::Encoder::from_rgba(image.as_raw(), width, height),
    };

    let mut config = webp::WebPConfig::new()
        .map_err(|_| OptimizeError::encode("WebP", "cannot initialize encoder configuration"))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = WEBP_METHOD;

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| OptimizeError::encode("WebP", format!("{:?}", e)))?;
    if memory.is_empty() {
        return Err(OptimizeError::encode("WebP", "encoder produced no data"));
    }
    Ok(memory.to_vec())
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, OptimizeError> {
    let mut bytes = Vec::new();
    // the jpeg encoder's scale starts at 1
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality.max(1));
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| OptimizeError::encode("JPEG", e))?;
    Ok(bytes)
}

/// Composite RGBA over opaque white for targets without an alpha channel.
fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
