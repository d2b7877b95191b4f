//! # Browser Capture Module
//!
//! Cattura tramite Chromium headless (feature `browser`).
//!
//! ## Flusso:
//! 1. Avvia il browser e apre una pagina vuota
//! 2. Registra il listener delle risposte di rete, poi naviga all'URL
//! 3. Attende `wait`, scorre la pagina a mezzo viewport per volta (lazy-load)
//! 4. Legge i body delle risposte immagine dal protocollo DevTools
//!
//! Vede anche le immagini caricate da script, che `HttpPageCapture` non può trovare.

use crate::archive::capture::{CapturedResponse, PageCapture, ResourceType};
use crate::error::ArchiveError;
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, GetResponseBodyParams, ResourceType as NetworkResourceType,
};
use chromiumoxide::Page;
use futures::StreamExt;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

const FALLBACK_SCROLL_STEP: u32 = 400;
const SCROLL_PAUSE: Duration = Duration::from_millis(200);
const SETTLE_PAUSE: Duration = Duration::from_secs(1);
const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

fn browser_error(e: impl ToString) -> ArchiveError {
    ArchiveError::Browser(e.to_string())
}

/// Page capture through a headless Chromium
pub struct BrowserPageCapture {
    timeout: Duration,
    wait: Duration,
}

impl BrowserPageCapture {
    pub fn new(timeout: Duration, wait: Duration) -> Self {
        Self { timeout, wait }
    }

    /// Navigate, wait and scroll; returns every response the page produced
    async fn load(&self, page: &Page, page_url: &Url) -> Result<Vec<CapturedResponse>, ArchiveError> {
        let mut events = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_error)?;

        tokio::time::timeout(self.timeout, page.goto(page_url.as_str()))
            .await
            .map_err(|_| browser_error(format!("navigation timed out after {:?}", self.timeout)))?
            .map_err(browser_error)?;

        tokio::time::sleep(self.wait).await;
        if let Err(e) = scroll_through(page).await {
            debug!("Scrolling {} failed: {}", page_url, e);
        }

        let mut received = Vec::new();
        while let Ok(Some(event)) = tokio::time::timeout(EVENT_DRAIN_TIMEOUT, events.next()).await {
            received.push(event);
        }
        info!("Browser saw {} responses on {}", received.len(), page_url);

        let mut responses = Vec::with_capacity(received.len());
        for event in received {
            let resource_type = match event.r#type {
                NetworkResourceType::Document => ResourceType::Document,
                NetworkResourceType::Stylesheet => ResourceType::Stylesheet,
                NetworkResourceType::Image => ResourceType::Image,
                _ => ResourceType::Other,
            };
            let content_type = event.response.mime_type.clone();
            let wanted = resource_type == ResourceType::Image || content_type.starts_with("image");

            let body = if wanted {
                match page.execute(GetResponseBodyParams::new(event.request_id.clone())).await {
                    Ok(reply) if reply.result.base64_encoded => {
                        match base64::engine::general_purpose::STANDARD.decode(&reply.result.body) {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                warn!("Undecodable body for {}: {}", event.response.url, e);
                                continue;
                            }
                        }
                    }
                    Ok(reply) => reply.result.body.into_bytes(),
                    Err(e) => {
                        debug!("No body for {}: {}", event.response.url, e);
                        continue;
                    }
                }
            } else {
                Vec::new()
            };

            responses.push(CapturedResponse {
                url: event.response.url.clone(),
                resource_type,
                content_type,
                body,
            });
        }

        Ok(responses)
    }
}

#[async_trait]
impl PageCapture for BrowserPageCapture {
    async fn capture(&self, page_url: &Url) -> Result<Vec<CapturedResponse>, ArchiveError> {
        let config = BrowserConfig::builder()
            .request_timeout(self.timeout)
            .build()
            .map_err(browser_error)?;
        let (mut browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler: {}", e);
                }
            }
        });

        let result = match browser.new_page("about:blank").await {
            Ok(page) => self.load(&page, page_url).await,
            Err(e) => Err(browser_error(e)),
        };

        if let Err(e) = browser.close().await {
            debug!("Closing browser: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

/// Scroll from the top to the bottom, half a viewport at a time
async fn scroll_through(page: &Page) -> Result<(), ArchiveError> {
    let viewport: f64 = page
        .evaluate("window.innerHeight")
        .await
        .map_err(browser_error)?
        .into_value()
        .map_err(browser_error)?;
    let total: f64 = page
        .evaluate("document.body.scrollHeight")
        .await
        .map_err(browser_error)?
        .into_value()
        .map_err(browser_error)?;

    for y in scroll_offsets(viewport.max(0.0) as u32, total.max(0.0) as u32) {
        page.evaluate(format!("window.scrollTo(0, {})", y))
            .await
            .map_err(browser_error)?;
        tokio::time::sleep(SCROLL_PAUSE).await;
    }
    tokio::time::sleep(SETTLE_PAUSE).await;
    Ok(())
}

/// Vertical positions visited while scrolling a page of height `total`
pub fn scroll_offsets(viewport: u32, total: u32) -> Vec<u32> {
    let step = match viewport / 2 {
        0 => FALLBACK_SCROLL_STEP,
        half => half,
    };
    (0..total).step_by(step as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offsets() {
        assert_eq!(scroll_offsets(800, 2000), vec![0, 400, 800, 1200, 1600]);
        assert_eq!(scroll_offsets(800, 1600), vec![0, 400, 800, 1200]);
        assert_eq!(scroll_offsets(0, 1000), vec![0, 400, 800]);
        assert_eq!(scroll_offsets(1, 900), vec![0, 400, 800]);
        assert!(scroll_offsets(600, 0).is_empty());
    }
}
