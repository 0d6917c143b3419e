//! Chain data collaborator.
//!
//! The resolver only needs three operations, so the collaborator is a small
//! trait. The production implementation talks to a Substrate API Sidecar
//! endpoint, which serves blocks with decoded extrinsics and events.

mod http;
mod models;

use async_trait::async_trait;
use error_stack::Result;

pub use self::http::{SidecarProvider, SidecarProviderOptions};
pub use self::models::{Block, Event, EventGroup, Extrinsic, RecordMethod};

#[derive(Debug)]
pub enum ProviderError {
    Request,
    Timeout,
    NotFound,
    DeserializeResponse,
    Configuration,
}

impl error_stack::Context for ProviderError {}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Request => write!(f, "failed to send request"),
            ProviderError::Timeout => write!(f, "request timed out"),
            ProviderError::NotFound => write!(f, "not found"),
            ProviderError::DeserializeResponse => write!(f, "failed to deserialize response"),
            ProviderError::Configuration => write!(f, "configuration error"),
        }
    }
}

/// Chain data source used to resolve index hits into full records.
#[async_trait]
pub trait ChainProvider {
    /// Hash of the block at the given height.
    async fn get_block_hash(&self, height: u64) -> Result<String, ProviderError>;

    /// All events in the given block, in block order.
    async fn get_events(&self, block_hash: &str) -> Result<Vec<Event>, ProviderError>;

    /// Full extrinsic record for a `"<block>-<index>"` identifier.
    async fn extrinsic_by_identifier(&self, identifier: &str) -> Result<Extrinsic, ProviderError>;
}
