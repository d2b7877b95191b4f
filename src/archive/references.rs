//! # Page References Module
//!
//! Estrazione dei riferimenti a immagini dal markup e dai fogli di stile.
//!
//! ## Sorgenti:
//! - `img` / `source` / `input` / `image`: `src`, `data-src`, `href`, `srcset`, `data-srcset`
//! - `link`: icone (`icon`, `apple-touch-icon`, ...), `preload` con `as="image"`
//! - `meta`: `og:image`, `twitter:image`
//! - CSS: `url(...)` in attributi `style`, blocchi `<style>` e fogli esterni
//!
//! Il documento è analizzato con un parser HTML vero: entità decodificate,
//! commenti e script ignorati. Gli URL sono risolti rispetto a `<base href>`
//! se presente, altrimenti rispetto all'URL della pagina.

use crate::archive::capture::ResourceType;
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// A resource the page will request
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub url: Url,
    pub resource_type: ResourceType,
}

/// Everything a page references, deduplicated, in document order
#[derive(Debug, Default)]
pub struct PageReferences {
    resources: Vec<Reference>,
    stylesheets: Vec<Url>,
    seen: HashSet<String>,
}

impl PageReferences {
    /// Resolve `raw` against `base` and keep it if it is a new http(s) URL
    fn push(&mut self, raw: &str, base: &Url, resource_type: ResourceType) {
        if let Some(url) = resolve(raw, base) {
            if self.seen.insert(url.to_string()) {
                self.resources.push(Reference { url, resource_type });
            }
        }
    }

    fn push_stylesheet(&mut self, raw: &str, base: &Url) {
        if let Some(url) = resolve(raw, base) {
            if !self.stylesheets.contains(&url) {
                self.stylesheets.push(url);
            }
        }
    }

    /// Add the `url(...)` references of a stylesheet. Fonts and imports land here too,
    /// so they are typed `Other` and only kept later if they turn out to be images.
    pub fn add_css(&mut self, css: &str, base: &Url) {
        for raw in css_urls(css) {
            self.push(raw, base, ResourceType::Other);
        }
    }

    pub fn resources(&self) -> &[Reference] {
        &self.resources
    }

    pub fn stylesheets(&self) -> &[Url] {
        &self.stylesheets
    }

    pub fn take_stylesheets(&mut self) -> Vec<Url> {
        std::mem::take(&mut self.stylesheets)
    }

    pub fn into_resources(self) -> Vec<Reference> {
        self.resources
    }
}

fn element_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        Selector::parse("img, source, input, image, link, meta, style, [style]").expect("valid selector")
    })
}

fn base_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("base[href]").expect("valid selector"))
}

fn css_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"')\s]+))\s*\)"#).expect("valid css url regex")
    })
}

/// Image and stylesheet references of an HTML document
pub fn extract_page_references(html: &str, page_url: &Url) -> PageReferences {
    let document = Html::parse_document(html);
    let base = document
        .select(base_selector())
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone());

    let mut references = PageReferences::default();

    for element in document.select(element_selector()) {
        let el = element.value();
        match el.name() {
            "img" | "source" | "input" | "image" => {
                for attr in ["src", "data-src", "href"] {
                    if let Some(value) = el.attr(attr) {
                        references.push(value, &base, ResourceType::Image);
                    }
                }
                for attr in ["srcset", "data-srcset"] {
                    if let Some(value) = el.attr(attr) {
                        for candidate in parse_srcset(value) {
                            references.push(candidate, &base, ResourceType::Image);
                        }
                    }
                }
            }
            "link" => {
                let rel: Vec<String> = el
                    .attr("rel")
                    .unwrap_or_default()
                    .split_ascii_whitespace()
                    .map(|token| token.to_ascii_lowercase())
                    .collect();
                let has = |token: &str| rel.iter().any(|r| r == token);
                let as_image = el.attr("as").is_some_and(|a| a.eq_ignore_ascii_case("image"));

                if let Some(href) = el.attr("href") {
                    if rel.iter().any(|r| r.ends_with("icon") || r.starts_with("apple-touch-icon"))
                        || (has("preload") && as_image)
                    {
                        references.push(href, &base, ResourceType::Image);
                    } else if has("stylesheet") {
                        references.push_stylesheet(href, &base);
                    }
                }
                if has("preload") && as_image {
                    if let Some(srcset) = el.attr("imagesrcset") {
                        for candidate in parse_srcset(srcset) {
                            references.push(candidate, &base, ResourceType::Image);
                        }
                    }
                }
            }
            "meta" => {
                let key = el
                    .attr("property")
                    .or_else(|| el.attr("name"))
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                if matches!(
                    key.as_str(),
                    "og:image" | "og:image:url" | "og:image:secure_url" | "twitter:image"
                ) {
                    if let Some(content) = el.attr("content") {
                        references.push(content, &base, ResourceType::Image);
                    }
                }
            }
            "style" => {
                let css: String = element.text().collect();
                references.add_css(&css, &base);
            }
            _ => {}
        }

        if let Some(style) = el.attr("style") {
            references.add_css(style, &base);
        }
    }

    references
}

/// Raw `url(...)` arguments of a stylesheet, in order
pub fn css_urls(css: &str) -> Vec<&str> {
    css_url_regex()
        .captures_iter(css)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)))
        .map(|m| m.as_str())
        .collect()
}

/// URLs of a `srcset` value. A candidate URL runs up to whitespace; a comma
/// only separates candidates when it ends the URL or follows the descriptors.
pub fn parse_srcset(value: &str) -> Vec<&str> {
    let mut urls = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let end = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
        let (url, after) = rest.split_at(end);
        rest = after;

        if url.ends_with(',') {
            let url = url.trim_end_matches(',');
            if !url.is_empty() {
                urls.push(url);
            }
            continue;
        }
        urls.push(url);

        // descriptors run to the next comma outside parentheses
        let mut depth = 0usize;
        let mut next = rest.len();
        for (i, c) in rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    next = i + 1;
                    break;
                }
                _ => {}
            }
        }
        rest = &rest[next..];
    }

    urls
}

fn resolve(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match base.join(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(_) => None,
        Err(e) => {
            debug!("Ignoring unparsable reference {}: {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    fn urls(references: &PageReferences) -> Vec<String> {
        references.resources().iter().map(|r| r.url.to_string()).collect()
    }

    #[test]
    fn test_markup_references_in_document_order() {
        let html = r#"
            <html><head>
              <link rel="icon" href="/favicon.ico">
              <link rel="apple-touch-icon" href="/touch.png">
              <link rel="stylesheet" href="/css/site.css">
              <meta property="og:image" content="https://cdn.example.com/og.png">
            </head><body>
              <img src="images/hero.png" alt="hero">
              <IMG SRC='/img/logo.svg'>
              <img data-src="lazy.webp" src="data:image/gif;base64,R0lGOD">
              <picture><source srcset="a-1x.jpg 1x, a-2x.jpg 2x"></picture>
              <img src="images/hero.png">
            </body></html>
        "#;

        let references = extract_page_references(html, &page());

        assert_eq!(
            urls(&references),
            vec![
                "https://example.com/favicon.ico",
                "https://example.com/touch.png",
                "https://cdn.example.com/og.png",
                "https://example.com/blog/images/hero.png",
                "https://example.com/img/logo.svg",
                "https://example.com/blog/lazy.webp",
                "https://example.com/blog/a-1x.jpg",
                "https://example.com/blog/a-2x.jpg",
            ]
        );
        assert!(references.resources().iter().all(|r| r.resource_type == ResourceType::Image));
        assert_eq!(
            references.stylesheets(),
            &[Url::parse("https://example.com/css/site.css").unwrap()]
        );
    }

    #[test]
    fn test_attribute_values_with_markup_characters() {
        let html = r#"<img alt="1 > 0" src="hero.png"><img title='a "quoted" > b' data-src="second.png">"#;
        let references = extract_page_references(html, &page());
        assert_eq!(
            urls(&references),
            vec!["https://example.com/blog/hero.png", "https://example.com/blog/second.png"]
        );
    }

    #[test]
    fn test_entities_are_decoded() {
        let html = r#"<img src="pic.png?x=1&amp;y=2&#38;z=3"><img src="caf&eacute;.png">"#;
        let references = extract_page_references(html, &page());
        assert_eq!(
            urls(&references),
            vec![
                "https://example.com/blog/pic.png?x=1&y=2&z=3",
                "https://example.com/blog/caf%C3%A9.png",
            ]
        );
    }

    #[test]
    fn test_comments_and_scripts_are_ignored() {
        let html = r#"
            <!-- <img src="ghost.png"> -->
            <script>document.write('<img src="fake.png">');</script>
            <img src="real.png">
        "#;
        let references = extract_page_references(html, &page());
        assert_eq!(urls(&references), vec!["https://example.com/blog/real.png"]);
    }

    #[test]
    fn test_srcset_urls_with_commas() {
        let html = r#"<img srcset="https://cdn.example.com/w_100,h_50/a.jpg 1x, https://cdn.example.com/w_200,h_100/a.jpg 2x">"#;
        let references = extract_page_references(html, &page());
        assert_eq!(
            urls(&references),
            vec![
                "https://cdn.example.com/w_100,h_50/a.jpg",
                "https://cdn.example.com/w_200,h_100/a.jpg",
            ]
        );
    }

    #[test]
    fn test_css_references() {
        let html = r#"
            <style>.hero { background: url("/bg/hero.jpg") no-repeat; } @font-face { src: url(font.woff2); }</style>
            <div style="background-image:url('banner.webp')"></div>
        "#;
        let references = extract_page_references(html, &page());

        assert_eq!(
            urls(&references),
            vec![
                "https://example.com/bg/hero.jpg",
                "https://example.com/blog/font.woff2",
                "https://example.com/blog/banner.webp",
            ]
        );
        assert!(references.resources().iter().all(|r| r.resource_type == ResourceType::Other));
    }

    #[test]
    fn test_external_stylesheet_resolves_against_its_own_url() {
        let mut references = PageReferences::default();
        let sheet = Url::parse("https://static.example.com/css/site.css").unwrap();
        references.add_css(".a { background: url(../img/bg.png) } .b { background: url(data:image/png;base64,AA) }", &sheet);
        assert_eq!(urls(&references), vec!["https://static.example.com/img/bg.png"]);
    }

    #[test]
    fn test_base_href() {
        let html = r#"<head><base href="https://static.example.com/assets/"></head><img src="x.png">"#;
        let references = extract_page_references(html, &page());
        assert_eq!(urls(&references), vec!["https://static.example.com/assets/x.png"]);
    }

    #[test]
    fn test_parse_srcset() {
        assert_eq!(parse_srcset("small.png 480w, large.png 1080w,  "), vec!["small.png", "large.png"]);
        assert_eq!(parse_srcset("a.png,b.png 2x"), vec!["a.png,b.png"]);
        assert_eq!(parse_srcset("a.png, b.png"), vec!["a.png", "b.png"]);
        assert_eq!(parse_srcset("only.png"), vec!["only.png"]);
        assert_eq!(parse_srcset("a.png 1x (x, y), b.png"), vec!["a.png", "b.png"]);
        assert!(parse_srcset("  ").is_empty());
    }
}
