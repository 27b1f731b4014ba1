use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::error::ScrapeError;
use crate::settings::Settings;

/// Non-200 response, kept apart from transport errors so callers can decide
/// which failure kind to report.
#[derive(Debug)]
pub enum GetError {
    Status(u16),
    Transport(reqwest::Error),
}

/// Shared HTTP client. Every request carries the configured User-Agent and
/// timeout.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self { client })
    }

    /// GET `url` and return the body of a 200 response.
    pub async fn get_page(&self, url: &str) -> Result<String, GetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(GetError::Transport)?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "response");
        if status != StatusCode::OK {
            return Err(GetError::Status(status.as_u16()));
        }

        response.text().await.map_err(GetError::Transport)
    }
}
