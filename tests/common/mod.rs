//! Scripted engines for exercising the tool handlers without Chrome.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use webfetch_mcp::browser::engine::{
    BrowserEngine, BrowserSession, HttpFetcher, Navigation, SessionOptions,
};
use webfetch_mcp::browser::tasks::FetchFastRequest;
use webfetch_mcp::EngineError;

pub const ARTICLE_HTML: &str = r#"<html><head><title>Fixture</title></head>
<body><nav>Menu</nav><h1 class="headline">Hello fixture</h1><p>Body copy</p></body></html>"#;

#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    max_active: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Browser engine serving canned pages
#[derive(Clone, Default)]
pub struct FakeEngine {
    pages: HashMap<String, String>,
    delay: Duration,
    log: Arc<Mutex<Vec<String>>>,
    counters: Arc<Counters>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Every navigation sleeps this long, to make sessions overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn max_concurrent(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn open_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, EngineError> {
        assert!(options.headless, "sessions must be headless");
        assert!(options.block_images, "sessions must block images");

        let counters = &self.counters;
        counters.opened.fetch_add(1, Ordering::SeqCst);
        let active = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_active.fetch_max(active, Ordering::SeqCst);

        self.record("open".to_string());
        Ok(Box::new(FakeSession {
            engine: self.clone(),
            current: None,
            closed: false,
        }))
    }
}

struct FakeSession {
    engine: FakeEngine,
    current: Option<String>,
    closed: bool,
}

impl FakeSession {
    fn html(&self) -> Result<&str, EngineError> {
        self.current
            .as_deref()
            .ok_or_else(|| EngineError::Browser("No page loaded".to_string()))
    }
}

/// Text of the first element matching `selector`, if any
fn first_match_text(html: &str, selector: &str) -> Result<Option<String>, EngineError> {
    let selector = scraper::Selector::parse(selector)
        .map_err(|e| EngineError::Browser(format!("Bad selector: {:?}", e)))?;
    let document = scraper::Html::parse_document(html);
    let text = document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>());
    Ok(text)
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(
        &mut self,
        url: &str,
        mode: Navigation,
        _timeout: Duration,
    ) -> Result<(), EngineError> {
        self.engine.record(format!("navigate:{}:{}", mode.as_str(), url));
        if !self.engine.delay.is_zero() {
            tokio::time::sleep(self.engine.delay).await;
        }

        match self.engine.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => Err(EngineError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        self.engine.record(format!("wait:{}", selector));
        match first_match_text(self.html()?, selector)? {
            Some(_) => Ok(()),
            None => Err(EngineError::Timeout {
                what: format!("selector '{}'", selector),
                secs: timeout.as_secs(),
            }),
        }
    }

    async fn page_html(&mut self) -> Result<String, EngineError> {
        self.engine.record("html".to_string());
        Ok(self.html()?.to_string())
    }

    async fn element_text(&mut self, selector: &str) -> Result<String, EngineError> {
        self.engine.record(format!("text:{}", selector));
        first_match_text(self.html()?, selector)?
            .ok_or_else(|| EngineError::Browser(format!("Element '{}' not found", selector)))
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        assert!(!self.closed, "session closed twice");
        self.closed = true;
        self.engine.record("close".to_string());
        self.engine.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.engine.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// HTTP fetcher that records requests instead of sending them
#[derive(Clone, Default)]
pub struct FakeHttp {
    requests: Arc<Mutex<Vec<FetchFastRequest>>>,
}

impl FakeHttp {
    pub fn requests(&self) -> Vec<FetchFastRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for FakeHttp {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> Result<String, EngineError> {
        self.requests.lock().unwrap().push(FetchFastRequest {
            url: url.to_string(),
            user_agent: user_agent.map(str::to_string),
        });
        Ok(format!("body of {}", url))
    }
}
