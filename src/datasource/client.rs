//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry logic (max 3 retries)
//! - Rate limit error handling

use crate::error::RegistryError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("deplookup/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RegistryError::NetworkError {
                package: String::new(),
                registry: "HTTP client".to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Perform a GET request with retry logic and error context
    pub async fn get_with_context(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(RegistryError::rate_limit_exceeded(registry));

                        if attempt < self.max_retries {
                            debug!(url, attempt, "rate limited, backing off");
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                            continue;
                        }
                        break;
                    }

                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(RegistryError::package_not_found(package, registry));
                    }

                    if !response.status().is_success() {
                        let status = response.status();
                        return Err(RegistryError::network_error(
                            package,
                            registry,
                            format!("HTTP {}", status),
                        ));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(RegistryError::timeout(package, registry));
                    } else {
                        last_error = Some(RegistryError::network_error(
                            package,
                            registry,
                            e.to_string(),
                        ));
                    }

                    if attempt < self.max_retries {
                        debug!(url, attempt, error = %e, "request failed, retrying");
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RegistryError::network_error(package, registry, "unknown error")))
    }

    /// Perform a GET request and parse JSON response with retry on parse errors
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<T, RegistryError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            // Network errors are already retried in get_with_context
            let response = self.get_with_context(url, package, registry).await?;

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    last_error = Some(RegistryError::InvalidResponse {
                        package: package.to_string(),
                        registry: registry.to_string(),
                        message: format!("failed to parse JSON: {}", e),
                    });

                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RegistryError::InvalidResponse {
            package: package.to_string(),
            registry: registry.to_string(),
            message: "unknown JSON parse error".to_string(),
        }))
    }
}
