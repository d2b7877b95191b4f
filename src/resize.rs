//! # Image Resize Module
//!
//! Questo modulo gestisce il ridimensionamento in memoria delle immagini raster.
//!
//! ## Caratteristiche
//! - **Solo downscaling**: un'immagine più stretta della larghezza massima non viene toccata
//! - **Aspect ratio preservato**: `new_height = round(height * max_width / width)`
//! - **Filtro configurabile**: Lanczos3 di default, qualità prima della velocità
//!   (l'ottimizzazione è un'operazione batch offline)
//!
//! ## Esempio:
//! ```rust,ignore
//! let resizer = ImageResizer::new(ResizeAlgorithm::Lanczos);
//! let resized = resizer.fit_width(image, 350);
//! ```

use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Algoritmi di resize disponibili
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeAlgorithm {
    /// Lanczos3 - Migliore qualità per downscaling (default)
    #[default]
    Lanczos,
    /// Catmull-Rom - Buona qualità generale, meno ringing
    CatmullRom,
    /// Gaussian - Risultato morbido
    Gaussian,
    /// Triangle - Veloce, qualità accettabile per anteprime
    Triangle,
    /// Nearest - Pixel perfetto per pixel art
    Nearest,
}

impl ResizeAlgorithm {
    /// Converte l'algoritmo nel filtro del crate `image`
    pub fn to_filter_type(&self) -> FilterType {
        match self {
            ResizeAlgorithm::Lanczos => FilterType::Lanczos3,
            ResizeAlgorithm::CatmullRom => FilterType::CatmullRom,
            ResizeAlgorithm::Gaussian => FilterType::Gaussian,
            ResizeAlgorithm::Triangle => FilterType::Triangle,
            ResizeAlgorithm::Nearest => FilterType::Nearest,
        }
    }
}

/// Compute the output size for a width cap, never upscaling.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    (max_width, scaled_height(width, height, max_width))
}

/// Height for `target_width` keeping the aspect ratio, rounded, at least 1.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    scaled.max(1)
}

/// Ridimensionatore in memoria
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer {
    algorithm: ResizeAlgorithm,
}

impl ImageResizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Ridimensiona alla larghezza massima se necessario, altrimenti restituisce l'immagine invariata
    pub fn fit_width(&self, image: DynamicImage, max_width: u32) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        let (new_width, new_height) = target_dimensions(width, height, max_width);

        if (new_width, new_height) == (width, height) {
            debug!("No resize needed (already {}px wide)", width);
            return image;
        }

        debug!(
            "Resizing from {}x{} to {}x{} using {:?}",
            width, height, new_width, new_height, self.algorithm
        );
        image.resize_exact(new_width, new_height, self.algorithm.to_filter_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_upscaling() {
        assert_eq!(target_dimensions(200, 200, 350), (200, 200));
        assert_eq!(target_dimensions(350, 100, 350), (350, 100));
    }

    #[test]
    fn test_downscale_keeps_aspect_ratio() {
        assert_eq!(target_dimensions(1000, 500, 350), (350, 175));
        assert_eq!(target_dimensions(1920, 1080, 700), (700, 394));
        assert_eq!(target_dimensions(3, 2, 2), (2, 1));
    }

    #[test]
    fn test_height_never_zero() {
        assert_eq!(target_dimensions(10_000, 1, 100), (100, 1));
    }

    #[test]
    fn test_fit_width_resizes() {
        let resizer = ImageResizer::new(ResizeAlgorithm::Lanczos);
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(800, 600));
        let resized = resizer.fit_width(image, 400);
        assert_eq!((resized.width(), resized.height()), (400, 300));
    }

    #[test]
    fn test_fit_width_passthrough() {
        let resizer = ImageResizer::default();
        let image = DynamicImage::ImageRgba8(image::RgbaImage::new(120, 80));
        let same = resizer.fit_width(image, 350);
        assert_eq!((same.width(), same.height()), (120, 80));
    }

    #[test]
    fn test_filter_mapping() {
        assert_eq!(ResizeAlgorithm::default(), ResizeAlgorithm::Lanczos);
        assert_eq!(ResizeAlgorithm::Lanczos.to_filter_type(), FilterType::Lanczos3);
        assert_eq!(ResizeAlgorithm::Nearest.to_filter_type(), FilterType::Nearest);
    }
}
