//! Humanized HTTP Fetcher
//!
//! A reqwest client that sends the headers a browser arriving from Google
//! would send. It never sets a User-Agent unless the caller supplies one.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::{debug, warn};

use super::engine::HttpFetcher;
use super::tasks::supplied;
use crate::error::EngineError;

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const GOOGLE_REFERRER: &str = "https://www.google.com/";

/// Single-attempt GET client
#[derive(Clone)]
pub struct HumanizedClient {
    client: reqwest::Client,
}

impl HumanizedClient {
    pub fn new() -> Result<Self, EngineError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
        headers.insert(REFERER, HeaderValue::from_static(GOOGLE_REFERRER));
        headers.insert(
            "upgrade-insecure-requests",
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for HumanizedClient {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> Result<String, EngineError> {
        let mut request = self.client.get(url);
        if let Some(ua) = supplied(user_agent) {
            request = request.header(USER_AGENT, ua);
        }

        debug!("GET {}", url);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
        }

        Ok(response.text().await?)
    }
}
