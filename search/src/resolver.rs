//! Reconciliation between index pointers and on-chain records.
//!
//! Pointers arrive block-ordered, so event resolution keeps a single-slot
//! per-block cache and only goes back to the node when the block number
//! changes. The cache is replaced as a unit (hash fetch + event fetch
//! complete before the slot is overwritten) and never serves events for a
//! different block, so interleaved pointers stay correct at the cost of
//! extra fetches.

use error_stack::{Report, Result, ResultExt};
use tracing::debug;

use crate::provider::{ChainProvider, Event, Extrinsic};
use crate::query::RecordPointer;

#[derive(Debug)]
pub enum ResolveError {
    /// The chain data source failed.
    Provider,
    /// A pointer references an event the node does not have for that block.
    /// Indicates the squid and the node disagree about the block.
    IndexOutOfRange {
        block_number: u64,
        index: usize,
        available: usize,
    },
}

impl error_stack::Context for ResolveError {}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Provider => write!(f, "failed to retrieve record from the node"),
            ResolveError::IndexOutOfRange {
                block_number,
                index,
                available,
            } => write!(
                f,
                "event index {index} out of range for block {block_number} \
                 ({available} events on-chain)"
            ),
        }
    }
}

pub trait ResolveErrorExt {
    fn is_index_out_of_range(&self) -> bool;
}

impl ResolveErrorExt for Report<ResolveError> {
    fn is_index_out_of_range(&self) -> bool {
        matches!(
            self.current_context(),
            ResolveError::IndexOutOfRange { .. }
        )
    }
}

struct BlockEventCache {
    block_number: u64,
    events: Vec<Event>,
}

/// Resolve event pointers into full events, order-preserving.
///
/// Either every pointer resolves or the pass fails; no partial output.
pub async fn resolve_events<P>(
    provider: &P,
    pointers: &[RecordPointer],
) -> Result<Vec<Event>, ResolveError>
where
    P: ChainProvider,
{
    let mut resolved = Vec::with_capacity(pointers.len());
    let mut cache: Option<BlockEventCache> = None;

    for pointer in pointers {
        let current = match cache.take() {
            Some(current) if current.block_number == pointer.block_number => current,
            _ => {
                debug!(block_number = pointer.block_number, "fetching block events");
                let block_hash = provider
                    .get_block_hash(pointer.block_number)
                    .await
                    .change_context(ResolveError::Provider)?;
                let events = provider
                    .get_events(&block_hash)
                    .await
                    .change_context(ResolveError::Provider)?;
                BlockEventCache {
                    block_number: pointer.block_number,
                    events,
                }
            }
        };

        let Some(event) = current.events.get(pointer.index_in_block) else {
            return Err(ResolveError::IndexOutOfRange {
                block_number: pointer.block_number,
                index: pointer.index_in_block,
                available: current.events.len(),
            })
            .attach_printable("squid and node disagree about this block");
        };

        resolved.push(event.clone());
        cache = Some(current);
    }

    Ok(resolved)
}

/// Resolve extrinsic pointers into full extrinsics, order-preserving.
pub async fn resolve_extrinsics<P>(
    provider: &P,
    pointers: &[RecordPointer],
) -> Result<Vec<Extrinsic>, ResolveError>
where
    P: ChainProvider,
{
    let mut resolved = Vec::with_capacity(pointers.len());

    for pointer in pointers {
        let identifier = format!("{}-{}", pointer.block_number, pointer.index_in_block);
        let extrinsic = provider
            .extrinsic_by_identifier(&identifier)
            .await
            .change_context(ResolveError::Provider)?;
        resolved.push(extrinsic);
    }

    Ok(resolved)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use error_stack::{Result, ResultExt};
    use serde_json::json;

    use crate::provider::{ChainProvider, Event, Extrinsic, ProviderError, RecordMethod};
    use crate::query::RecordPointer;

    use super::{resolve_events, resolve_extrinsics, ResolveError, ResolveErrorExt};

    pub fn test_event(block_number: u64, index: usize) -> Event {
        Event {
            method: RecordMethod {
                pallet: "Balances".to_string(),
                method: "Transfer".to_string(),
            },
            data: json!([block_number, index]),
        }
    }

    pub fn test_extrinsic(identifier: &str) -> Extrinsic {
        Extrinsic {
            method: RecordMethod {
                pallet: "Balances".to_string(),
                method: "transfer_keep_alive".to_string(),
            },
            signature: None,
            args: json!({ "id": identifier }),
            events: Vec::new(),
            success: Some(true),
        }
    }

    pub struct StubProvider {
        blocks: HashMap<u64, Vec<Event>>,
        pub event_fetches: AtomicUsize,
        pub identifiers: Mutex<Vec<String>>,
    }

    impl StubProvider {
        pub fn new(blocks: HashMap<u64, Vec<Event>>) -> Self {
            Self {
                blocks,
                event_fetches: AtomicUsize::new(0),
                identifiers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChainProvider for StubProvider {
        async fn get_block_hash(&self, height: u64) -> Result<String, ProviderError> {
            Ok(format!("0xhash-{height}"))
        }

        async fn get_events(&self, block_hash: &str) -> Result<Vec<Event>, ProviderError> {
            self.event_fetches.fetch_add(1, Ordering::SeqCst);
            let height: u64 = block_hash
                .trim_start_matches("0xhash-")
                .parse()
                .map_err(|_| ProviderError::Request)
                .attach_printable_lazy(|| format!("unexpected hash: {block_hash}"))?;
            self.blocks
                .get(&height)
                .cloned()
                .ok_or(ProviderError::NotFound)
                .attach_printable_lazy(|| format!("height: {height}"))
        }

        async fn extrinsic_by_identifier(
            &self,
            identifier: &str,
        ) -> Result<Extrinsic, ProviderError> {
            self.identifiers
                .lock()
                .unwrap()
                .push(identifier.to_string());
            Ok(test_extrinsic(identifier))
        }
    }

    fn pointer(block_number: u64, index_in_block: usize) -> RecordPointer {
        RecordPointer {
            block_number,
            index_in_block,
            extrinsic_index: None,
        }
    }

    fn blocks() -> HashMap<u64, Vec<Event>> {
        let mut blocks = HashMap::new();
        blocks.insert(
            100,
            vec![test_event(100, 0), test_event(100, 1), test_event(100, 2)],
        );
        blocks.insert(101, vec![test_event(101, 0), test_event(101, 1)]);
        blocks
    }

    #[tokio::test]
    async fn test_resolution_preserves_pointer_order() {
        let provider = StubProvider::new(blocks());
        let pointers = [pointer(100, 2), pointer(100, 0), pointer(101, 1)];

        let events = resolve_events(&provider, &pointers).await.unwrap();

        assert_eq!(
            events,
            vec![test_event(100, 2), test_event(100, 0), test_event(101, 1)]
        );
        // One fetch per distinct block: the second pointer hits the cache.
        assert_eq!(provider.event_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_interleaved_blocks_stay_correct() {
        let provider = StubProvider::new(blocks());
        let pointers = [pointer(100, 0), pointer(101, 0), pointer(100, 1)];

        let events = resolve_events(&provider, &pointers).await.unwrap();

        assert_eq!(
            events,
            vec![test_event(100, 0), test_event(101, 0), test_event(100, 1)]
        );
        // Cache misses on every block change.
        assert_eq!(provider.event_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_index_out_of_range_is_surfaced() {
        let provider = StubProvider::new(blocks());
        let pointers = [pointer(100, 0), pointer(100, 7)];

        let report = resolve_events(&provider, &pointers).await.unwrap_err();

        assert!(report.is_index_out_of_range());
        assert_matches!(
            report.current_context(),
            ResolveError::IndexOutOfRange {
                block_number: 100,
                index: 7,
                available: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_provider_failure_fails_the_pass() {
        let provider = StubProvider::new(HashMap::new());
        let pointers = [pointer(100, 0)];

        let report = resolve_events(&provider, &pointers).await.unwrap_err();
        assert_matches!(report.current_context(), ResolveError::Provider);
    }

    #[tokio::test]
    async fn test_extrinsic_identifiers() {
        let provider = StubProvider::new(HashMap::new());
        let pointers = [pointer(500, 3), pointer(500, 0), pointer(499, 1)];

        let extrinsics = resolve_extrinsics(&provider, &pointers).await.unwrap();

        assert_eq!(extrinsics.len(), 3);
        assert_eq!(
            *provider.identifiers.lock().unwrap(),
            vec!["500-3", "500-0", "499-1"]
        );
    }

    #[tokio::test]
    async fn test_empty_pointer_list() {
        let provider = StubProvider::new(HashMap::new());

        let events = resolve_events(&provider, &[]).await.unwrap();
        assert!(events.is_empty());
        assert_eq!(provider.event_fetches.load(Ordering::SeqCst), 0);
    }
}
