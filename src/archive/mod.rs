//! # Archive Module
//!
//! Scarica le immagini di una pagina web e le raccoglie in un file zip.
//!
//! ## Responsabilità:
//! - `capture`: cattura delle risposte della pagina e filtro delle immagini
//! - `references`: riferimenti a immagini e fogli di stile nel markup e nel CSS
//! - `browser`: cattura con Chromium headless (feature `browser`)
//! - `naming`: nomi file sicuri e senza collisioni
//! - `writer`: scrittura dell'archivio zip
//!
//! ## Flusso:
//! 1. Validazione dell'URL della pagina
//! 2. Cattura delle risposte tramite un `PageCapture`
//! 3. Filtro e deduplica per URL (ordine di prima cattura)
//! 4. Scrittura dell'archivio, solo se ci sono immagini

#[cfg(feature = "browser")]
pub mod browser;
pub mod capture;
pub mod naming;
pub mod references;
pub mod writer;

#[cfg(feature = "browser")]
pub use browser::BrowserPageCapture;
pub use capture::{CapturedImages, CapturedResponse, HttpPageCapture, PageCapture, ResourceType};
pub use references::{extract_page_references, PageReferences};
pub use writer::{write_archive, ArchiveSummary};

use crate::error::ArchiveError;
use reqwest::Url;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

/// Parse and check the page URL; only http(s) pages can be captured
pub fn parse_page_url(raw: &str) -> Result<Url, ArchiveError> {
    let url = Url::parse(raw).map_err(|e| ArchiveError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ArchiveError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Capture the images of `page_url` and write them to `zip_out`.
///
/// Returns `None` when the page produced no image, in which case no file is written.
pub async fn archive_page(
    capture: &dyn PageCapture,
    page_url: &str,
    zip_out: &Path,
) -> Result<Option<ArchiveSummary>, ArchiveError> {
    let url = parse_page_url(page_url)?;
    info!("Capturing {}", url);

    let responses = capture.capture(&url).await?;
    let seen = responses.len();
    let images: CapturedImages = responses.into_iter().collect();
    info!("Captured {} responses, {} images", seen, images.len());

    if images.is_empty() {
        warn!("No images found on {}", url);
        return Ok(None);
    }

    if let Some(parent) = zip_out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let zip_path = zip_out.to_path_buf();
    let summary = tokio::task::spawn_blocking(move || -> Result<ArchiveSummary, ArchiveError> {
        let file = File::create(&zip_path)?;
        let (_, summary) = write_archive(BufWriter::new(file), &images)?;
        Ok(summary)
    })
    .await
    .map_err(|e| ArchiveError::Io(std::io::Error::other(e)))??;

    info!(
        "Wrote {} images ({} bytes) to {}",
        summary.written(),
        summary.total_bytes,
        zip_out.display()
    );
    if summary.failed > 0 {
        warn!("{} images could not be written", summary.failed);
    }

    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedCapture(Vec<CapturedResponse>);

    #[async_trait]
    impl PageCapture for FixedCapture {
        async fn capture(&self, _page_url: &Url) -> Result<Vec<CapturedResponse>, ArchiveError> {
            Ok(self.0.clone())
        }
    }

    fn response(url: &str, resource_type: ResourceType, content_type: &str) -> CapturedResponse {
        CapturedResponse {
            url: url.to_string(),
            resource_type,
            content_type: content_type.to_string(),
            body: url.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_parse_page_url() {
        assert!(parse_page_url("https://example.com/page").is_ok());
        assert!(matches!(
            parse_page_url("not a url"),
            Err(ArchiveError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_page_url("ftp://example.com/"),
            Err(ArchiveError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_archive_page_writes_images() {
        let temp = TempDir::new().unwrap();
        let zip_out = temp.path().join("nested/out.zip");
        let capture = FixedCapture(vec![
            response("https://example.com/", ResourceType::Document, "text/html"),
            response("https://example.com/a.png", ResourceType::Image, "image/png"),
            response("https://example.com/api", ResourceType::Other, "application/json"),
            response("https://example.com/b", ResourceType::Other, "image/webp"),
        ]);

        let summary = archive_page(&capture, "https://example.com/", &zip_out)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.entries, vec!["a.png", "b.webp"]);
        let archive = zip::ZipArchive::new(File::open(&zip_out).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[tokio::test]
    async fn test_archive_page_without_images_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let zip_out = temp.path().join("out.zip");
        let capture = FixedCapture(vec![response(
            "https://example.com/",
            ResourceType::Document,
            "text/html",
        )]);

        let summary = archive_page(&capture, "https://example.com/", &zip_out).await.unwrap();

        assert!(summary.is_none());
        assert!(!zip_out.exists());
    }
}
