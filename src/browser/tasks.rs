//! Browser Tasks
//!
//! Typed requests for each browser-backed tool. A request is also the task
//! that runs against a session, so the tool handler only has to parse it
//! and hand it to the executor.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::engine::{BrowserSession, BrowserTask, Navigation};
use super::pool::effective_parallelism;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::EngineError;

fn default_timeout() -> i64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_parallel() -> i64 {
    3
}

/// Longest wait a single browser step will honour
pub const MAX_TIMEOUT_SECS: i64 = 24 * 60 * 60;

/// Out-of-range timeouts are not rejected. Negative values expire
/// immediately and anything above a day is held to a day.
pub fn timeout_from_secs(secs: i64) -> Duration {
    Duration::from_secs(secs.clamp(0, MAX_TIMEOUT_SECS) as u64)
}

/// An empty optional string counts as not supplied
pub(crate) fn supplied(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// `fetch_page`
#[derive(Debug, Clone, Deserialize)]
pub struct FetchPageRequest {
    pub url: String,
    #[serde(default)]
    pub bypass_cloudflare: bool,
    #[serde(default)]
    pub wait_for_selector: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: i64,
}

impl FetchPageRequest {
    pub fn selector(&self) -> Option<&str> {
        supplied(self.wait_for_selector.as_deref())
    }
}

#[async_trait]
impl BrowserTask for FetchPageRequest {
    type Output = String;

    async fn run(&self, session: &mut dyn BrowserSession) -> Result<String, EngineError> {
        let timeout = timeout_from_secs(self.timeout);
        session
            .navigate(&self.url, Navigation::for_bypass(self.bypass_cloudflare), timeout)
            .await?;

        if let Some(selector) = self.selector() {
            session.wait_for_selector(selector, timeout).await?;
        }

        session.page_html().await
    }
}

/// `fetch_page_fast` (served by the HTTP fetcher, not a browser task)
#[derive(Debug, Clone, Deserialize)]
pub struct FetchFastRequest {
    pub url: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl FetchFastRequest {
    pub fn user_agent(&self) -> Option<&str> {
        supplied(self.user_agent.as_deref())
    }
}

/// `google_fetch`
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleFetchRequest {
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout: i64,
}

#[async_trait]
impl BrowserTask for GoogleFetchRequest {
    type Output = String;

    async fn run(&self, session: &mut dyn BrowserSession) -> Result<String, EngineError> {
        session
            .navigate(
                &self.url,
                Navigation::GoogleReferrer,
                timeout_from_secs(self.timeout),
            )
            .await?;
        session.page_html().await
    }
}

/// `extract_text`
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractTextRequest {
    pub url: String,
    pub selector: String,
    #[serde(default)]
    pub bypass_cloudflare: bool,
    #[serde(default = "default_timeout")]
    pub timeout: i64,
}

#[async_trait]
impl BrowserTask for ExtractTextRequest {
    type Output = String;

    async fn run(&self, session: &mut dyn BrowserSession) -> Result<String, EngineError> {
        let timeout = timeout_from_secs(self.timeout);
        session
            .navigate(&self.url, Navigation::for_bypass(self.bypass_cloudflare), timeout)
            .await?;
        session.wait_for_selector(&self.selector, timeout).await?;
        session.element_text(&self.selector).await
    }
}

/// `fetch_multiple_pages`
#[derive(Debug, Clone, Deserialize)]
pub struct FetchMultipleRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub bypass_cloudflare: bool,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: i64,
}

impl FetchMultipleRequest {
    pub fn parallelism(&self) -> usize {
        effective_parallelism(self.max_parallel)
    }

    /// One task per distinct URL, first occurrence wins
    pub fn page_tasks(&self) -> Vec<PageTask> {
        let mut seen = std::collections::HashSet::new();
        self.urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .map(|url| PageTask {
                url: url.clone(),
                bypass_cloudflare: self.bypass_cloudflare,
                timeout: default_timeout(),
            })
            .collect()
    }
}

/// A single page of a batch fetch; yields `(url, html)`
#[derive(Debug, Clone)]
pub struct PageTask {
    pub url: String,
    pub bypass_cloudflare: bool,
    pub timeout: i64,
}

#[async_trait]
impl BrowserTask for PageTask {
    type Output = (String, String);

    async fn run(&self, session: &mut dyn BrowserSession) -> Result<(String, String), EngineError> {
        session
            .navigate(
                &self.url,
                Navigation::for_bypass(self.bypass_cloudflare),
                timeout_from_secs(self.timeout),
            )
            .await?;
        let html = session.page_html().await?;
        Ok((self.url.clone(), html))
    }
}
