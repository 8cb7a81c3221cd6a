//! Browser and HTTP Engines
//!
//! - `engine`: capability traits the tool handlers program against
//! - `chrome`: headless Chrome via chromiumoxide
//! - `http`: humanized single-shot GET via reqwest
//! - `pool`: session executor and bounded parallel pool
//! - `tasks`: typed requests that run as browser tasks

pub mod chrome;
pub mod engine;
pub mod http;
pub mod pool;
pub mod tasks;

pub use chrome::ChromeEngine;
pub use engine::{BrowserEngine, BrowserSession, BrowserTask, HttpFetcher, Navigation, SessionOptions};
pub use http::HumanizedClient;
pub use pool::{effective_parallelism, BrowserPool, MAX_PARALLEL};
