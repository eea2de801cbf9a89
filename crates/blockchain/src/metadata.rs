use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{Error, Result};
use tracing::{debug, warn};

use crate::types::{non_empty, OffChainMetadata};

/// Fetches the off-chain JSON document referenced by on-chain metadata
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<OffChainMetadata>;
}

/// Plain HTTP GET metadata fetcher
pub struct HttpMetadataFetcher {
    client: Client,
}

impl HttpMetadataFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpMetadataFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, uri: &str) -> Result<OffChainMetadata> {
        debug!("Fetching off-chain metadata from {}", uri);

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("Metadata request failed: {}", e)))?;

        if !response.status().is_success() {
            warn!("Metadata URI {} returned status {}", uri, response.status());
            return Err(Error::ExternalService(format!(
                "Metadata URI returned error status: {}",
                response.status()
            )));
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Failed to parse metadata JSON: {}", e)))?;

        Ok(parse_off_chain_metadata(&document))
    }
}

/// Keep only string-valued `image` and `description` fields
pub fn parse_off_chain_metadata(document: &Value) -> OffChainMetadata {
    let field = |name: &str| non_empty(document.get(name).and_then(Value::as_str).map(str::to_string));

    OffChainMetadata {
        image: field("image"),
        description: field("description"),
    }
}
