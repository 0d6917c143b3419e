use std::time::Duration;

use error_stack::{Result, ResultExt};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, StatusCode,
};

use super::models;
use super::{ChainProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct SidecarProviderOptions {
    /// Request timeout.
    pub timeout: Duration,
    /// Headers to send with the requests.
    pub headers: HeaderMap<HeaderValue>,
}

impl Default for SidecarProviderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            headers: HeaderMap::new(),
        }
    }
}

/// Substrate API Sidecar client.
#[derive(Clone)]
pub struct SidecarProvider {
    client: Client,
    url: String,
    options: SidecarProviderOptions,
}

impl SidecarProvider {
    pub fn new(url: impl Into<String>, options: SidecarProviderOptions) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            url,
            options,
        }
    }

    /// Fetch a block by height or hash.
    #[tracing::instrument(level = "debug", skip(self), err(Debug))]
    async fn get_block(&self, block_id: &str) -> Result<models::Block, ProviderError> {
        let url = format!("{}/blocks/{}", self.url, block_id);

        let request = self
            .client
            .get(&url)
            .headers(self.options.headers.clone())
            .send();

        let Ok(response) = tokio::time::timeout(self.options.timeout, request).await else {
            return Err(ProviderError::Timeout)
                .attach_printable("failed to get block")
                .attach_printable_lazy(|| format!("block id: {block_id}"));
        };

        let response = response
            .change_context(ProviderError::Request)
            .attach_printable("failed to get block")
            .attach_printable_lazy(|| format!("block id: {block_id}"))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(ProviderError::NotFound)
                    .attach_printable_lazy(|| format!("block id: {block_id}"));
            }
            status if !status.is_success() => {
                return Err(ProviderError::Request)
                    .attach_printable_lazy(|| format!("status code: {status}"))
                    .attach_printable_lazy(|| format!("block id: {block_id}"));
            }
            _ => {}
        }

        response
            .json::<models::Block>()
            .await
            .change_context(ProviderError::DeserializeResponse)
            .attach_printable_lazy(|| format!("block id: {block_id}"))
    }
}

#[async_trait::async_trait]
impl ChainProvider for SidecarProvider {
    async fn get_block_hash(&self, height: u64) -> Result<String, ProviderError> {
        let block = self.get_block(&height.to_string()).await?;
        Ok(block.hash)
    }

    async fn get_events(&self, block_hash: &str) -> Result<Vec<models::Event>, ProviderError> {
        let block = self.get_block(block_hash).await?;
        Ok(block.events())
    }

    async fn extrinsic_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<models::Extrinsic, ProviderError> {
        let parsed = identifier
            .split_once('-')
            .and_then(|(block, index)| Some((block.to_string(), index.parse::<usize>().ok()?)));

        let Some((block_id, index)) = parsed else {
            return Err(ProviderError::Configuration)
                .attach_printable_lazy(|| format!("malformed extrinsic identifier: {identifier}"));
        };

        let block = self.get_block(&block_id).await?;
        let extrinsic_count = block.extrinsics.len();

        block
            .extrinsics
            .into_iter()
            .nth(index)
            .ok_or(ProviderError::NotFound)
            .attach_printable_lazy(|| format!("extrinsic identifier: {identifier}"))
            .attach_printable_lazy(|| format!("block has {extrinsic_count} extrinsics"))
    }
}
