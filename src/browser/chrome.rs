//! Headless Chrome Engine
//!
//! `BrowserEngine` backed by chromiumoxide. Every session launches its own
//! Chrome process with a throwaway profile directory, so nothing leaks
//! between calls.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, trace};

use super::engine::{BrowserEngine, BrowserSession, Navigation, SessionOptions};
use super::http::GOOGLE_REFERRER;
use crate::config::Config;
use crate::error::EngineError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const CHALLENGE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Patched into every document before page scripts run in bypass mode
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// Titles served by anti-bot interstitials while they run their checks
const CHALLENGE_TITLES: &[&str] = &[
    "just a moment",
    "attention required",
    "checking your browser",
    "please wait",
    "ddos-guard",
];

fn is_challenge_title(title: &str) -> bool {
    let title = title.to_lowercase();
    CHALLENGE_TITLES.iter().any(|marker| title.contains(marker))
}

fn challenge_timeout(url: &str, limit: Duration) -> EngineError {
    EngineError::Timeout {
        what: format!("anti-bot challenge on '{}'", url),
        secs: limit.as_secs(),
    }
}

/// Chrome command-line flags for a session
fn launch_args(options: &SessionOptions) -> Vec<String> {
    let mut args: Vec<String> = [
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--no-first-run",
        "--no-default-browser-check",
        "--disable-default-apps",
        "--disable-extensions",
        "--disable-dev-shm-usage",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if options.block_images {
        args.push("--blink-settings=imagesEnabled=false".to_string());
    }

    args
}

/// Launches one Chrome per session
pub struct ChromeEngine {
    chrome_path: Option<PathBuf>,
    launch_timeout: Duration,
    no_sandbox: bool,
}

impl ChromeEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            launch_timeout: config.launch_timeout(),
            no_sandbox: config.no_sandbox,
        }
    }

    fn browser_config(
        &self,
        options: &SessionOptions,
        profile_dir: &Path,
    ) -> Result<BrowserConfig, EngineError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .user_data_dir(profile_dir)
            .args(launch_args(options));

        if !options.headless {
            builder = builder.with_head();
        }
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(EngineError::Launch)
    }
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    async fn open_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, EngineError> {
        let profile_dir = std::env::temp_dir().join(format!("webfetch-{}", uuid::Uuid::new_v4()));
        let config = self.browser_config(options, &profile_dir)?;

        let (browser, mut handler) = timeout(self.launch_timeout, Browser::launch(config))
            .await
            .map_err(|_| {
                EngineError::Launch(format!(
                    "timed out after {}s - Chrome may not be installed or is unresponsive",
                    self.launch_timeout.as_secs()
                ))
            })?
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("Browser handler error: {}", e);
                }
            }
        });

        let mut session = ChromeSession {
            browser,
            page: None,
            handler,
            profile_dir,
            closed: false,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => session.page = Some(page),
            Err(e) => {
                session.close().await.ok();
                return Err(EngineError::Browser(format!("Failed to create page: {}", e)));
            }
        }

        debug!("Opened browser session in {}", session.profile_dir.display());
        Ok(Box::new(session))
    }
}

struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    closed: bool,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Browser("No page available".to_string()))
    }

    async fn goto(
        &self,
        url: &str,
        params: NavigateParams,
        limit: Duration,
    ) -> Result<(), EngineError> {
        let page = self.page()?;
        match timeout(limit, page.goto(params)).await {
            Err(_) => Err(EngineError::Timeout {
                what: format!("navigation to '{}'", url),
                secs: limit.as_secs(),
            }),
            Ok(Err(e)) => Err(EngineError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Hide the usual automation tells before the first navigation
    async fn apply_stealth(&self) -> Result<(), EngineError> {
        let page = self.page()?;

        let user_agent = page
            .evaluate("navigator.userAgent")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| EngineError::Browser(e.to_string()))?
            .replace("HeadlessChrome", "Chrome");

        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        Ok(())
    }

    async fn title(&self) -> Result<String, EngineError> {
        let value = self
            .page()?
            .evaluate("document.title")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        Ok(value.into_value::<String>().unwrap_or_default())
    }

    /// Poll until the interstitial hands over to the real page
    async fn wait_out_challenge(
        &self,
        url: &str,
        started: Instant,
        limit: Duration,
    ) -> Result<(), EngineError> {
        loop {
            if !is_challenge_title(&self.title().await?) {
                return Ok(());
            }
            if started.elapsed() >= limit {
                return Err(challenge_timeout(url, limit));
            }
            sleep(CHALLENGE_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(
        &mut self,
        url: &str,
        mode: Navigation,
        limit: Duration,
    ) -> Result<(), EngineError> {
        info!("Navigating to {} ({})", url, mode.as_str());
        let started = Instant::now();

        match mode {
            Navigation::Direct => self.goto(url, NavigateParams::new(url), limit).await,
            Navigation::BypassCloudflare => {
                self.apply_stealth().await?;
                self.goto(url, NavigateParams::new(url), limit).await?;
                self.wait_out_challenge(url, started, limit).await
            }
            Navigation::GoogleReferrer => {
                let params = NavigateParams::builder()
                    .url(url)
                    .referrer(GOOGLE_REFERRER)
                    .build()
                    .map_err(EngineError::Browser)?;
                self.goto(url, params, limit).await
            }
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        limit: Duration,
    ) -> Result<(), EngineError> {
        debug!("Waiting for '{}' (timeout: {}s)", selector, limit.as_secs());
        let page = self.page()?;
        let start = Instant::now();

        loop {
            if page.find_element(selector).await.is_ok() {
                debug!("Element '{}' found after {}ms", selector, start.elapsed().as_millis());
                return Ok(());
            }
            if start.elapsed() >= limit {
                return Err(EngineError::Timeout {
                    what: format!("selector '{}'", selector),
                    secs: limit.as_secs(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn page_html(&mut self) -> Result<String, EngineError> {
        self.page()?
            .content()
            .await
            .map_err(|e| EngineError::Browser(format!("Failed to get DOM content: {}", e)))
    }

    async fn element_text(&mut self, selector: &str) -> Result<String, EngineError> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|e| EngineError::Browser(format!("Element '{}' not found: {}", selector, e)))?;

        let text = element
            .inner_text()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        Ok(text.unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page = None;

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Browser(format!("Failed to close browser: {}", e)));
        self.browser.wait().await.ok();
        self.handler.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!("Could not remove {}: {}", self.profile_dir.display(), e);
        }

        result
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if !self.closed {
            self.handler.abort();
            std::fs::remove_dir_all(&self.profile_dir).ok();
        }
    }
}
