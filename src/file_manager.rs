//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery delle immagini.
//!
//! ## Responsabilità:
//! - Discovery di immagini in una directory (solo primo livello o ricorsiva)
//! - Determinazione formato file dall'estensione
//! - Scrittura sicura dell'output con creazione delle directory parent
//! - Utilità per dimensioni, percentuali e nomi SEO-friendly
//!
//! ## Formati supportati:
//! - **Raster**: PNG, JPG, JPEG, WebP
//! - **Vettoriali**: SVG
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::find_image_files(Path::new("/path/to/images"), false)?;
//! for file in files {
//!     if FileManager::is_vector(&file) {
//!         // needs a rasterizer
//!     }
//! }
//! ```

use crate::error::OptimizeError;
use crate::media::SUPPORTED_EXTENSIONS;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all supported image files in a directory, sorted by path
    pub fn find_image_files(image_dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        let mut walker = WalkDir::new(image_dir).follow_links(true);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_supported_format(path))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Lower-case extension of a path, empty if none
    pub fn extension_of(path: &Path) -> String {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        SUPPORTED_EXTENSIONS.contains(&Self::extension_of(path).as_str())
    }

    /// Check if a file is a vector image
    pub fn is_vector(path: &Path) -> bool {
        Self::extension_of(path) == "svg"
    }

    /// Write optimized bytes, creating parent directories as needed
    pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), OptimizeError> {
        let to_write_error = |source| OptimizeError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(to_write_error)?;
        }
        fs::write(path, bytes).await.map_err(to_write_error)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }

    /// Lower-case, dash-separated file stem ("My Photo_01" -> "my-photo-01")
    pub fn seo_friendly_name(name: &str) -> String {
        let lower = name.to_lowercase();
        let mut out = String::with_capacity(lower.len());
        for c in lower.chars() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                out.push(c);
            } else if !out.ends_with('-') {
                out.push('-');
            }
        }
        out.trim_matches('-').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_image_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpeg"), b"x").unwrap();
        std::fs::write(dir.path().join("logo.svg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("old.bmp"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/c.webp"), b"x").unwrap();

        let flat = FileManager::find_image_files(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpeg", "b.PNG", "logo.svg"]);

        let deep = FileManager::find_image_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 4);
        assert!(deep.iter().any(|p| p.ends_with("nested/c.webp")));
    }

    #[test]
    fn test_format_checks() {
        assert!(FileManager::is_supported_format(Path::new("x.JPG")));
        assert!(FileManager::is_supported_format(Path::new("x.svg")));
        assert!(!FileManager::is_supported_format(Path::new("x.bmp")));
        assert!(!FileManager::is_supported_format(Path::new("noext")));
        assert!(FileManager::is_vector(Path::new("logo.SVG")));
        assert!(!FileManager::is_vector(Path::new("logo.png")));
    }

    #[tokio::test]
    async fn test_write_output_creates_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/out.webp");
        FileManager::write_output(&target, b"data").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"data");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(FileManager::calculate_reduction(0, 10), 0.0);
        assert_eq!(FileManager::calculate_reduction(200, 50), 75.0);
        assert!(FileManager::calculate_reduction(100, 150) < 0.0);
    }

    #[test]
    fn test_seo_friendly_name() {
        assert_eq!(FileManager::seo_friendly_name("My Photo_01"), "my-photo-01");
        assert_eq!(FileManager::seo_friendly_name("--Hello__World--"), "hello-world");
        assert_eq!(FileManager::seo_friendly_name("Càfé"), "c-f");
        assert_eq!(FileManager::seo_friendly_name("***"), "");
    }
}
