//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di output.
//! L'estensione di output è sempre quella canonica del formato scelto,
//! qualunque cosa abbia scritto il chiamante.
//!
//! In modalità batch due input non finiscono mai sullo stesso file:
//! `photo.jpg` e `photo.png` diventano `photo.webp` e `photo-png.webp`.

use crate::{config::Config, file_manager::FileManager};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stem used when SEO normalization leaves nothing
const FALLBACK_STEM: &str = "image";

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Output path for single-file mode: the caller's path with the extension forced
    pub fn get_single_output_path(requested_output: &Path, config: &Config) -> PathBuf {
        let stem = requested_output
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let filename = Self::output_file_name(&stem, config);

        let resolved = requested_output.with_file_name(filename);
        if resolved != requested_output {
            debug!(
                "Output path corrected: {} -> {}",
                requested_output.display(),
                resolved.display()
            );
        }
        resolved
    }

    /// Output path for batch mode, mirroring the input's sub-directory under `output_dir`
    pub fn get_output_path(
        input_path: &Path,
        input_base_dir: &Path,
        output_dir: &Path,
        config: &Config,
    ) -> PathBuf {
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let filename = Self::output_file_name(&stem, config);

        let relative_dir = match input_path.strip_prefix(input_base_dir) {
            Ok(rel) => rel.parent().unwrap_or(Path::new("")),
            Err(_) => Path::new(""),
        };

        let result = output_dir.join(relative_dir).join(filename);
        debug!("Resolved output path: {} -> {}", input_path.display(), result.display());
        result
    }

    /// Output paths for a whole batch, one per input and all distinct.
    ///
    /// The first input (in the given order) keeps its natural name. A later clash gets
    /// the source extension appended to the stem, then `_<n>` if that is taken too.
    /// Paths are compared case-insensitively.
    pub fn get_batch_output_paths(
        files: &[PathBuf],
        input_base_dir: &Path,
        output_dir: &Path,
        config: &Config,
    ) -> Vec<PathBuf> {
        let mut used = HashSet::new();
        let key = |path: &Path| path.to_string_lossy().to_lowercase();

        files
            .iter()
            .map(|input| {
                let preferred = Self::get_output_path(input, input_base_dir, output_dir, config);
                if used.insert(key(&preferred)) {
                    return preferred;
                }

                let stem = preferred
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let source_ext = FileManager::extension_of(input);
                let ext = config.output_format.extension();

                let mut candidate = preferred.with_file_name(format!("{}-{}.{}", stem, source_ext, ext));
                let mut counter = 1;
                while !used.insert(key(&candidate)) {
                    candidate =
                        preferred.with_file_name(format!("{}-{}_{}.{}", stem, source_ext, counter, ext));
                    counter += 1;
                }

                warn!(
                    "{} would overwrite {}; writing {} instead",
                    input.display(),
                    preferred.display(),
                    candidate.display()
                );
                candidate
            })
            .collect()
    }

    /// File name for an input stem under the current configuration
    fn output_file_name(stem: &str, config: &Config) -> String {
        let stem = if config.seo_filenames {
            FileManager::seo_friendly_name(stem)
        } else {
            stem.to_string()
        };
        let stem = if stem.is_empty() { FALLBACK_STEM } else { stem.as_str() };

        format!("{}.{}", stem, config.output_format.extension())
    }
}
