use anyhow::{Context, Result};
use std::time::Duration;

const USER_AGENT: &str = concat!("cudnn-links/", env!("CARGO_PKG_VERSION"));

/// Fetches a URL and returns the body as text.
///
/// Implementations block until the whole body has arrived. Any error is a
/// transport failure and aborts the run.
pub trait Transport {
    fn get_text(&self, url: &str) -> Result<String>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_text(&self, url: &str) -> Result<String> {
        (**self).get_text(url)
    }
}

pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// `None` means requests may block indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, url: &str) -> Result<String> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .with_context(|| format!("Failed to fetch {}", url))?;

        response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}
