//! Configuration management
//!
//! Every setting is optional; with an empty environment the server runs
//! headless Chrome from the default install location.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Default navigation / selector-wait timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chrome/Chromium executable (auto-detect if None)
    pub chrome_path: Option<PathBuf>,

    /// How long to wait for Chrome to come up
    pub launch_timeout_secs: u64,

    /// Pass --no-sandbox to Chrome (needed in most containers)
    pub no_sandbox: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chrome_path: None,
            launch_timeout_secs: 30,
            no_sandbox: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let chrome_path = std::env::var("CHROME_PATH").ok().map(PathBuf::from);

        let launch_timeout_secs = std::env::var("BROWSER_LAUNCH_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let no_sandbox = std::env::var("BROWSER_NO_SANDBOX")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            chrome_path,
            launch_timeout_secs,
            no_sandbox,
        })
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }
}
