//! # Page Capture Module
//!
//! Raccolta delle risposte di rete di una pagina e filtro delle immagini.
//!
//! ## Componenti:
//! - `CapturedResponse`: URL, tipo di risorsa, content type e body di una risposta
//! - `PageCapture`: capacità che carica una pagina e restituisce le sue risposte
//! - `HttpPageCapture`: implementazione con `reqwest` (documento, fogli di stile, immagini riferite)
//! - `BrowserPageCapture`: Chromium headless con attesa e scroll (feature `browser`)
//! - `CapturedImages`: mappa URL → immagine che preserva l'ordine di prima cattura
//!
//! ## Filtro:
//! Una risposta è un'immagine se il tipo di risorsa è `Image`, oppure se il
//! content type inizia con `image`.

use crate::error::ArchiveError;
use async_trait::async_trait;
use crate::archive::references::{extract_page_references, PageReferences};
use futures::{stream, StreamExt};
use reqwest::{header::CONTENT_TYPE, Url};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// What the page requested a resource as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Other,
}

/// One network response seen while loading a page
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub resource_type: ResourceType,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl CapturedResponse {
    pub fn is_image(&self) -> bool {
        self.resource_type == ResourceType::Image || self.content_type.starts_with("image")
    }
}

/// A retained image body
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Image responses keyed by URL, in first-capture order
#[derive(Debug, Default)]
pub struct CapturedImages {
    entries: Vec<CapturedImage>,
    index: HashMap<String, usize>,
}

impl CapturedImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the response if it is an image. A repeated URL keeps its position and takes the new body.
    pub fn record(&mut self, response: CapturedResponse) -> bool {
        if !response.is_image() {
            return false;
        }

        let image = CapturedImage {
            url: response.url,
            content_type: response.content_type,
            body: response.body,
        };
        match self.index.get(&image.url) {
            Some(&position) => self.entries[position] = image,
            None => {
                self.index.insert(image.url.clone(), self.entries.len());
                self.entries.push(image);
            }
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapturedImage> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CapturedResponse> for CapturedImages {
    fn from_iter<I: IntoIterator<Item = CapturedResponse>>(iter: I) -> Self {
        let mut images = Self::new();
        for response in iter {
            images.record(response);
        }
        images
    }
}

/// Loads a page and reports the responses it produced
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, page_url: &Url) -> Result<Vec<CapturedResponse>, ArchiveError>;
}

/// Page capture over plain HTTP: fetches the document and its stylesheets, then every
/// resource they reference. Script-driven loads are not seen.
pub struct HttpPageCapture {
    client: reqwest::Client,
    concurrency: usize,
}

impl HttpPageCapture {
    pub fn new(timeout: Duration, concurrency: usize) -> Result<Self, ArchiveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            concurrency: concurrency.max(1),
        })
    }

    /// Fetch one referenced resource; failures drop the response
    async fn fetch_resource(&self, url: Url, resource_type: ResourceType) -> Option<CapturedResponse> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Request failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Skipping {} (status {})", url, response.status());
            return None;
        }

        let content_type = content_type_of(&response);
        match response.bytes().await {
            Ok(body) => Some(CapturedResponse {
                url: url.to_string(),
                resource_type,
                content_type,
                body: body.to_vec(),
            }),
            Err(e) => {
                debug!("Could not read body of {}: {}", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl PageCapture for HttpPageCapture {
    async fn capture(&self, page_url: &Url) -> Result<Vec<CapturedResponse>, ArchiveError> {
        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await?
            .error_for_status()?;
        let final_url = response.url().clone();
        let content_type = content_type_of(&response);
        let body = response.bytes().await?.to_vec();

        let mut references = if content_type.starts_with("image") {
            PageReferences::default()
        } else {
            extract_page_references(&String::from_utf8_lossy(&body), &final_url)
        };

        let mut responses = vec![CapturedResponse {
            url: final_url.to_string(),
            resource_type: ResourceType::Document,
            content_type,
            body,
        }];

        let stylesheets: Vec<_> = stream::iter(references.take_stylesheets())
            .map(|url| self.fetch_resource(url, ResourceType::Stylesheet))
            .buffered(self.concurrency)
            .collect()
            .await;
        for sheet in stylesheets.into_iter().flatten() {
            if let Ok(sheet_url) = Url::parse(&sheet.url) {
                references.add_css(&String::from_utf8_lossy(&sheet.body), &sheet_url);
            }
            responses.push(sheet);
        }

        let resources = references.into_resources();
        info!("Found {} resource references on {}", resources.len(), final_url);

        let fetched: Vec<_> = stream::iter(resources)
            .map(|reference| self.fetch_resource(reference.url, reference.resource_type))
            .buffered(self.concurrency)
            .collect()
            .await;
        responses.extend(fetched.into_iter().flatten());

        Ok(responses)
    }
}

fn content_type_of(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
