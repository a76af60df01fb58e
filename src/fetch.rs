/*!
 * Fetching the provider catalog from the network
 *
 * The directory is fed by a single HTTP GET to a fixed endpoint that returns
 * a JSON array of provider objects.
 */

use std::time::Duration;
use tracing::{info, warn};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{Result, DirectoryError};
use crate::config::DirectoryConfig;
use crate::data_types::RawProviderRecord;

/// HTTP fetcher for the raw provider catalog
pub struct CatalogFetcher {
    endpoint: String,
    timeout: Duration,
    user_agent: String,
    show_progress: bool,
    client: Option<reqwest::Client>,
}

impl Default for CatalogFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogFetcher {
    /// Create a fetcher for the default endpoint
    pub fn new() -> Self {
        Self::with_config(&DirectoryConfig::default())
    }

    /// Create a fetcher from directory configuration
    pub fn with_config(config: &DirectoryConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            user_agent: config.user_agent.clone()
                .unwrap_or_else(|| format!("doctor-directory/{}", env!("CARGO_PKG_VERSION"))),
            show_progress: config.show_progress,
            client: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get or create HTTP client
    fn client(&mut self) -> Result<reqwest::Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| DirectoryError::Custom {
                message: format!("Failed to create HTTP client: {}", e),
                suggestion: Some("Check your network configuration".to_string()),
            })?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Fetch the raw provider list
    ///
    /// A transport error, a non-success status, or a body that is not a JSON
    /// array of providers all surface as [`DirectoryError::NetworkFailure`].
    pub async fn fetch_raw(&mut self) -> Result<Vec<RawProviderRecord>> {
        let client = self.client()?;
        let endpoint = self.endpoint.clone();

        #[cfg(feature = "progress")]
        let spinner = self.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("Fetching providers from {}", endpoint));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let result = Self::request(&client, &endpoint).await;

        #[cfg(feature = "progress")]
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match &result {
            Ok(records) => info!(endpoint = %endpoint, records = records.len(), "fetched provider catalog"),
            Err(e) => warn!(endpoint = %endpoint, error = %e, "provider catalog fetch failed"),
        }
        result
    }

    async fn request(client: &reqwest::Client, endpoint: &str) -> Result<Vec<RawProviderRecord>> {
        let response = client.get(endpoint).send().await.map_err(|e| {
            DirectoryError::network(format!("Failed to connect: {}", e), Some(endpoint), None)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::network(
                format!("HTTP error {}", status),
                Some(endpoint),
                Some(status.as_u16()),
            ));
        }

        response.json::<Vec<RawProviderRecord>>().await.map_err(|e| {
            DirectoryError::network(format!("Invalid provider list: {}", e), Some(endpoint), None)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_fetcher_uses_config() {
        let config = ConfigBuilder::new()
            .endpoint("http://127.0.0.1:9/doctors.json")
            .user_agent("tests")
            .build();
        let fetcher = CatalogFetcher::with_config(&config);
        assert_eq!(fetcher.endpoint(), "http://127.0.0.1:9/doctors.json");
        assert_eq!(fetcher.user_agent, "tests");
    }

    #[test]
    fn test_unreachable_endpoint_is_network_failure() {
        let config = ConfigBuilder::new()
            .endpoint("http://127.0.0.1:9/doctors.json")
            .timeout_seconds(2)
            .show_progress(false)
            .build();
        let mut fetcher = CatalogFetcher::with_config(&config);
        let err = tokio_test::block_on(fetcher.fetch_raw()).unwrap_err();
        assert!(matches!(err, DirectoryError::NetworkFailure { status: None, .. }));
    }
}
