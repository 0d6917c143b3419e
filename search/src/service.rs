//! Public search surface.
//!
//! `SearchService` composes the two collaborators explicitly: the squid
//! for locating records, the chain provider for resolving them.

use chrono::{DateTime, Utc};
use error_stack::{Result, ResultExt};
use tracing::debug;

use crate::error::SearchError;
use crate::filter::{EventCriteria, ExtrinsicCriteria, Page};
use crate::indexer::Indexer;
use crate::locator;
use crate::provider::{ChainProvider, Event, Extrinsic};
use crate::query;
use crate::resolver;

pub struct SearchService<I, P> {
    indexer: I,
    provider: P,
}

impl<I, P> SearchService<I, P>
where
    I: Indexer,
    P: ChainProvider,
{
    pub fn new(indexer: I, provider: P) -> Self {
        Self { indexer, provider }
    }

    /// Search for events and resolve each hit on-chain.
    ///
    /// Returns one event per index hit, in the indexer's order (record id
    /// descending). Either every hit resolves or the call fails.
    pub async fn filter_events(
        &self,
        criteria: &EventCriteria,
        page: &Page,
    ) -> Result<Vec<Event>, SearchError> {
        let clauses = criteria.to_clauses().change_context(SearchError::Filter)?;

        let pointers = query::fetch_event_pointers(&self.indexer, &clauses, page)
            .await
            .change_context(SearchError::Query)?;
        debug!(matches = pointers.len(), "resolving event search hits");

        resolver::resolve_events(&self.provider, &pointers)
            .await
            .change_context(SearchError::Resolve)
    }

    /// Search for extrinsics and resolve each hit on-chain.
    pub async fn filter_extrinsics(
        &self,
        criteria: &ExtrinsicCriteria,
        page: &Page,
    ) -> Result<Vec<Extrinsic>, SearchError> {
        let clauses = criteria.to_clauses().change_context(SearchError::Filter)?;

        let pointers = query::fetch_extrinsic_pointers(&self.indexer, &clauses, page)
            .await
            .change_context(SearchError::Query)?;
        debug!(matches = pointers.len(), "resolving extrinsic search hits");

        resolver::resolve_extrinsics(&self.provider, &pointers)
            .await
            .change_context(SearchError::Resolve)
    }

    /// Find the block produced at exactly `block_datetime`.
    ///
    /// See [`locator::search_block_number`] for the exact-equality caveat.
    pub async fn search_block_number(
        &self,
        block_datetime: DateTime<Utc>,
        block_time: u64,
    ) -> Result<Option<u64>, SearchError> {
        locator::search_block_number(&self.indexer, block_datetime, block_time)
            .await
            .change_context(SearchError::Query)
    }
}
