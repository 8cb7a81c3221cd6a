//! Engine Capabilities
//!
//! The handlers never talk to Chrome or reqwest directly. They see a
//! `BrowserEngine` that opens sessions, a `BrowserSession` that can navigate,
//! wait and read, and an `HttpFetcher` for plain GETs.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::EngineError;

/// How a session reaches the target URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Plain navigation
    Direct,
    /// Stealth profile plus waiting out the anti-bot interstitial
    BypassCloudflare,
    /// Arrive with a Google search referrer
    GoogleReferrer,
}

impl Navigation {
    pub fn for_bypass(bypass_cloudflare: bool) -> Self {
        if bypass_cloudflare {
            Self::BypassCloudflare
        } else {
            Self::Direct
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::BypassCloudflare => "bypass_cloudflare",
            Self::GoogleReferrer => "google_referrer",
        }
    }
}

/// Options applied when a session is opened
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub block_images: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            block_images: true,
        }
    }
}

/// Opens isolated browser sessions. Sessions are never reused.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn open_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, EngineError>;
}

/// A single live page in its own browser
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(
        &mut self,
        url: &str,
        mode: Navigation,
        timeout: Duration,
    ) -> Result<(), EngineError>;

    /// Resolve once `selector` is present in the rendered DOM
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), EngineError>;

    async fn page_html(&mut self) -> Result<String, EngineError>;

    /// Text content of the first element matching `selector`
    async fn element_text(&mut self, selector: &str) -> Result<String, EngineError>;

    /// Tear the session down. Called exactly once per session.
    async fn close(&mut self) -> Result<(), EngineError>;
}

/// Single-shot HTTP GET without a rendering engine
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> Result<String, EngineError>;
}

/// Unit of work run against one session
#[async_trait]
pub trait BrowserTask: Send + Sync {
    type Output: Send;

    async fn run(&self, session: &mut dyn BrowserSession) -> Result<Self::Output, EngineError>;
}
