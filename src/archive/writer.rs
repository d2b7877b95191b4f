//! # Archive Writer
//!
//! Scrive le immagini catturate in un archivio zip (deflate).
//! Ogni voce riceve un nome sicuro e univoco; se la scrittura di una voce
//! fallisce, la voce viene saltata e l'archivio prosegue.

use crate::archive::capture::CapturedImages;
use crate::archive::naming::{entry_name, UniqueNames};
use crate::error::ArchiveError;
use std::io::{Seek, Write};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Result of writing an archive
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArchiveSummary {
    /// Entry names in archive order
    pub entries: Vec<String>,
    pub failed: usize,
    pub total_bytes: u64,
}

impl ArchiveSummary {
    pub fn written(&self) -> usize {
        self.entries.len()
    }
}

/// Write every captured image into a zip stream and return the finished writer
pub fn write_archive<W: Write + Seek>(
    sink: W,
    images: &CapturedImages,
) -> Result<(W, ArchiveSummary), ArchiveError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(sink);
    let mut names = UniqueNames::new();
    let mut summary = ArchiveSummary::default();

    for image in images.iter() {
        let name = names.claim(&entry_name(&image.url, &image.content_type));

        let written = zip
            .start_file(name.as_str(), options)
            .map_err(ArchiveError::from)
            .and_then(|_| zip.write_all(&image.body).map_err(ArchiveError::from));

        match written {
            Ok(()) => {
                debug!("Added {} ({} bytes) from {}", name, image.body.len(), image.url);
                summary.total_bytes += image.body.len() as u64;
                summary.entries.push(name);
            }
            Err(e) => {
                warn!("Skipping {}: {}", image.url, e);
                summary.failed += 1;
            }
        }
    }

    let sink = zip.finish()?;
    Ok((sink, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::capture::{CapturedResponse, ResourceType};
    use std::io::{Cursor, Read};

    fn image(url: &str, content_type: &str, body: &[u8]) -> CapturedResponse {
        CapturedResponse {
            url: url.to_string(),
            resource_type: ResourceType::Image,
            content_type: content_type.to_string(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_archive_entries_round_trip() {
        let images: CapturedImages = vec![
            image("https://a.com/x/logo.png", "image/png", b"first-logo"),
            image("https://b.com/y/logo.png", "image/png", b"second-logo"),
            image("https://a.com/pixel", "image/gif", b"GIF89a"),
        ]
        .into_iter()
        .collect();

        let (cursor, summary) = write_archive(Cursor::new(Vec::new()), &images).unwrap();
        assert_eq!(summary.entries, vec!["logo.png", "logo_1.png", "pixel.gif"]);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total_bytes, 10 + 11 + 6);

        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(archive.len(), 3);

        let mut contents = Vec::new();
        archive.by_name("logo_1.png").unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"second-logo");

        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "logo.png");
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn test_empty_capture_produces_empty_archive() {
        let (_, summary) = write_archive(Cursor::new(Vec::new()), &CapturedImages::new()).unwrap();
        assert_eq!(summary.written(), 0);
    }
}
