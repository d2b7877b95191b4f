//! # Vector Rasterization Module
//!
//! Capacità opzionale di rasterizzazione SVG.
//!
//! ## Responsabilità:
//! - Definisce il trait `Rasterizer` passato esplicitamente all'`ImageProcessor`
//! - Fornisce `ResvgRasterizer` quando la feature `svg` è attiva
//! - `default_rasterizer()` restituisce `None` se la capacità non è compilata
//!
//! L'assenza della capacità non è un flag globale: l'ottimizzatore la vede come
//! `Option` e produce `VectorRasterizationUnavailable` quando serve.

use crate::error::OptimizeError;
use image::RgbaImage;
use std::sync::Arc;

/// Something that can turn vector markup into pixels at a given width.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `data` so the output is exactly `width` pixels wide.
    fn rasterize(&self, data: &[u8], width: u32) -> Result<RgbaImage, OptimizeError>;

    fn name(&self) -> &'static str;
}

/// The rasterizer compiled into this build, if any.
pub fn default_rasterizer() -> Option<Arc<dyn Rasterizer>> {
    #[cfg(feature = "svg")]
    {
        Some(Arc::new(ResvgRasterizer))
    }

    #[cfg(not(feature = "svg"))]
    {
        None
    }
}

#[cfg(feature = "svg")]
pub use self::resvg_backend::ResvgRasterizer;

#[cfg(feature = "svg")]
mod resvg_backend {
    use super::Rasterizer;
    use crate::error::OptimizeError;
    use crate::resize::scaled_height;
    use image::RgbaImage;
    use resvg::{tiny_skia, usvg};
    use tracing::debug;

    /// SVG rasterizer backed by resvg
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ResvgRasterizer;

    impl Rasterizer for ResvgRasterizer {
        fn rasterize(&self, data: &[u8], width: u32) -> Result<RgbaImage, OptimizeError> {
            let options = usvg::Options::default();
            let tree = usvg::Tree::from_data(data, &options)
                .map_err(|e| OptimizeError::decode("SVG", e))?;

            let size = tree.size();
            if size.width() <= 0.0 || size.height() <= 0.0 {
                return Err(OptimizeError::decode("SVG", "document has an empty size"));
            }

            let source_width = size.width().round().max(1.0) as u32;
            let source_height = size.height().round().max(1.0) as u32;
            let height = scaled_height(source_width, source_height, width);
            debug!(
                "Rasterizing SVG {}x{} to {}x{}",
                size.width(),
                size.height(),
                width,
                height
            );

            let mut pixmap = tiny_skia::Pixmap::new(width, height)
                .ok_or_else(|| OptimizeError::decode("SVG", "cannot allocate raster buffer"))?;
            let transform = tiny_skia::Transform::from_scale(
                width as f32 / size.width(),
                height as f32 / size.height(),
            );
            resvg::render(&tree, transform, &mut pixmap.as_mut());

            // tiny-skia stores premultiplied alpha
            let mut raw = Vec::with_capacity(rgba_buffer_len(width, height));
            for pixel in pixmap.pixels() {
                let color = pixel.demultiply();
                raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
            }

            RgbaImage::from_raw(width, height, raw)
                .ok_or_else(|| OptimizeError::decode("SVG", "raster buffer size mismatch"))
        }

        fn name(&self) -> &'static str {
            "resvg"
        }
    }

    /// Bytes of an RGBA8 buffer, computed in `usize` so large rasters cannot wrap
    pub(super) fn rgba_buffer_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}

#[cfg(all(test, feature = "svg"))]
mod tests {
    use super::*;

    const SQUARE: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">
        <rect x="0" y="0" width="50" height="50" fill="#ff0000"/>
    </svg>"##;

    #[test]
    fn test_rasterize_to_target_width() {
        let rasterizer = ResvgRasterizer;
        let image = rasterizer.rasterize(SQUARE, 350).unwrap();
        assert_eq!(image.dimensions(), (350, 175));
    }

    #[test]
    fn test_rasterize_keeps_transparency() {
        let rasterizer = ResvgRasterizer;
        let image = rasterizer.rasterize(SQUARE, 100).unwrap();
        // left half painted red, right half untouched
        assert_eq!(image.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(90, 10).0[3], 0);
    }

    #[test]
    fn test_invalid_markup() {
        let rasterizer = ResvgRasterizer;
        let result = rasterizer.rasterize(b"<svg", 100);
        assert!(matches!(result, Err(OptimizeError::Decode { .. })));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_buffer_len_does_not_wrap() {
        use super::resvg_backend::rgba_buffer_len;
        assert_eq!(rgba_buffer_len(350, 175), 245_000);
        // 70000 * 20000 * 4 is past u32::MAX
        assert_eq!(rgba_buffer_len(70_000, 20_000), 5_600_000_000);
    }

    #[test]
    fn test_default_rasterizer_present() {
        assert!(default_rasterizer().is_some());
    }
}
