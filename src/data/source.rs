//! HTTP retrieval of the published case CSV.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::AppError;

/// Jena open-data export of COVID-19 case counts.
pub const DEFAULT_DATA_URL: &str =
    "https://opendata.jena.de/dataset/2cc7773d-beba-43ad-9808-a420a2fc0a9b/resource/d3ba07b6-fb19-451b-b902-5b18d8e8cbad/download/corona_erkrankungen_jena.csv";

/// Environment variable (or `.env` entry) overriding the dataset URL.
pub const DATA_URL_ENV: &str = "CASES_DATA_URL";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DatasetClient {
    client: Client,
    url: String,
}

impl DatasetClient {
    pub fn new(url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("case-curves/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Build a client for the URL configured in the environment (`.env` honored).
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(configured_url(None))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the CSV body. Any transport or HTTP failure is fatal.
    pub fn fetch_csv(&self) -> Result<String, AppError> {
        info!(url = %self.url, "fetching dataset");

        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::new(4, format!("Dataset request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Dataset request failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read dataset response: {e}")))?;
        debug!(bytes = body.len(), "dataset downloaded");
        Ok(body)
    }
}

/// Resolve the dataset URL: explicit flag, then environment, then the default.
pub fn configured_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }
    dotenvy::dotenv().ok();
    std::env::var(DATA_URL_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins() {
        assert_eq!(configured_url(Some("http://localhost/x.csv")), "http://localhost/x.csv");
    }

    #[test]
    fn env_url_overrides_default() {
        // SAFETY: no other test in this crate reads or writes CASES_DATA_URL.
        unsafe { std::env::set_var(DATA_URL_ENV, " http://localhost/env.csv ") };
        let client = DatasetClient::from_env().unwrap();
        assert_eq!(client.url(), "http://localhost/env.csv");
        assert_eq!(configured_url(Some("http://localhost/flag.csv")), "http://localhost/flag.csv");
        unsafe { std::env::remove_var(DATA_URL_ENV) };
    }

    #[test]
    fn client_keeps_url() {
        let client = DatasetClient::new("http://localhost/cases.csv").unwrap();
        assert_eq!(client.url(), "http://localhost/cases.csv");
    }
}
