//! # Archive Entry Naming
//!
//! Nomi file sicuri per le voci dell'archivio, derivati da URL e content type.
//!
//! ## Regole:
//! - Estensione dal sottotipo del content type (`image/png; q=1` → `png`),
//!   solo se composto da `[a-z0-9]`, altrimenti `img`
//! - Nome = ultimo segmento del path URL (percent-decoded)
//! - Path vuoto → `image.<ext>`; nome senza punto → `<nome>.<ext>`
//! - Ogni carattere fuori da `[A-Za-z0-9._-]` diventa `_`
//! - Collisioni: `<base>_<n><ext>` con n = 1, 2, ...

use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::collections::HashSet;

/// Extension used when the content type gives nothing usable
pub const DEFAULT_EXTENSION: &str = "img";

/// Extension candidate from a content type, e.g. `image/webp` -> `webp`
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    if !content_type.contains('/') {
        return None;
    }

    let subtype = content_type
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    let valid = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    valid.then(|| subtype.to_string())
}

/// Safe archive file name for a URL
pub fn safe_filename_from_url(url: &str, default_ext: &str) -> String {
    let raw_path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let path = percent_decode_str(&raw_path).decode_utf8_lossy();
    let basename = path.rsplit('/').next().unwrap_or_default();

    let mut name = if basename.is_empty() {
        format!("image.{}", default_ext)
    } else {
        basename.to_string()
    };
    if !name.contains('.') {
        name = format!("{}.{}", name, default_ext);
    }

    sanitize(&name)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Split `name` into stem and extension (with dot); leading dots belong to the stem
fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(pos) => name.split_at(leading + pos),
        None => (name, ""),
    }
}

/// Tracks names already used in an archive
#[derive(Debug, Default)]
pub struct UniqueNames {
    used: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `name`, or the first free `<base>_<n><ext>` variant of it
    pub fn claim(&mut self, name: &str) -> String {
        let (base, ext) = split_extension(name);
        let mut candidate = name.to_string();
        let mut counter = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}{}", base, counter, ext);
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// File name for a captured image
pub fn entry_name(url: &str, content_type: &str) -> String {
    let ext = extension_from_content_type(content_type);
    safe_filename_from_url(url, ext.as_deref().unwrap_or(DEFAULT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(extension_from_content_type("image/png").as_deref(), Some("png"));
        assert_eq!(extension_from_content_type("image/jpeg; charset=binary").as_deref(), Some("jpeg"));
        assert_eq!(extension_from_content_type("image/svg+xml"), None);
        assert_eq!(extension_from_content_type("image/PNG"), None);
        assert_eq!(extension_from_content_type("image/"), None);
        assert_eq!(extension_from_content_type("png"), None);
        assert_eq!(extension_from_content_type(""), None);
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            safe_filename_from_url("https://example.com/assets/logo.png?v=3", "png"),
            "logo.png"
        );
        assert_eq!(
            safe_filename_from_url("https://example.com/img/photo%20one.jpg", "jpeg"),
            "photo_one.jpg"
        );
        assert_eq!(
            safe_filename_from_url("https://example.com/avatar", "webp"),
            "avatar.webp"
        );
        assert_eq!(safe_filename_from_url("https://example.com/", "gif"), "image.gif");
        assert_eq!(
            safe_filename_from_url("https://cdn.example.com/a/b/caf%C3%A9.png", "png"),
            "caf_.png"
        );
    }

    #[test]
    fn test_entry_name_default_extension() {
        assert_eq!(entry_name("https://example.com/pixel", "image/svg+xml"), "pixel.img");
        assert_eq!(entry_name("https://example.com/pixel", "image/gif"), "pixel.gif");
    }

    #[test]
    fn test_unique_names() {
        let mut names = UniqueNames::new();
        assert_eq!(names.claim("logo.png"), "logo.png");
        assert_eq!(names.claim("logo.png"), "logo_1.png");
        assert_eq!(names.claim("logo.png"), "logo_2.png");
        assert_eq!(names.claim("archive.tar.gz"), "archive.tar.gz");
        assert_eq!(names.claim("archive.tar.gz"), "archive.tar_1.gz");
        assert_eq!(names.claim("noext"), "noext");
        assert_eq!(names.claim("noext"), "noext_1");
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.png"), ("a", ".png"));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("plain"), ("plain", ""));
    }
}
