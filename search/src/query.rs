//! Query documents and pointer extraction.
//!
//! Queries select only what is needed to re-locate a record on-chain: the
//! block number and the in-block index (plus the parent extrinsic's index
//! for events). Results are ordered by record id descending, so pointers
//! for the same block arrive contiguously.

use error_stack::{Result, ResultExt};
use serde_json::Value;

use crate::filter::{render_clauses, FilterClause, Page};
use crate::indexer::{Indexer, IndexerError};

/// Lightweight locator for one indexed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPointer {
    pub block_number: u64,
    pub index_in_block: usize,
    /// In-block index of the parent extrinsic, for events that have one.
    pub extrinsic_index: Option<usize>,
}

pub(crate) fn events_document(clauses: &[FilterClause], page: &Page) -> String {
    format!(
        "query {{ events(orderBy: id_DESC, limit: {limit}, offset: {offset}, where: {filter}) \
         {{ blockNumber indexInBlock extrinsic {{ indexInBlock }} }} }}",
        limit = page.page_size,
        offset = page.offset(),
        filter = render_clauses(clauses),
    )
}

pub(crate) fn extrinsics_document(clauses: &[FilterClause], page: &Page) -> String {
    format!(
        "query {{ extrinsics(orderBy: id_DESC, limit: {limit}, offset: {offset}, where: {filter}) \
         {{ blockNumber indexInBlock }} }}",
        limit = page.page_size,
        offset = page.offset(),
        filter = render_clauses(clauses),
    )
}

/// Fetch pointers to events matching the given clauses.
pub async fn fetch_event_pointers<I>(
    indexer: &I,
    clauses: &[FilterClause],
    page: &Page,
) -> Result<Vec<RecordPointer>, IndexerError>
where
    I: Indexer,
{
    let document = events_document(clauses, page);
    let data = indexer.execute(&document).await?;
    parse_pointers(&data, "events", true)
}

/// Fetch pointers to extrinsics matching the given clauses.
pub async fn fetch_extrinsic_pointers<I>(
    indexer: &I,
    clauses: &[FilterClause],
    page: &Page,
) -> Result<Vec<RecordPointer>, IndexerError>
where
    I: Indexer,
{
    let document = extrinsics_document(clauses, page);
    let data = indexer.execute(&document).await?;
    parse_pointers(&data, "extrinsics", false)
}

fn parse_pointers(
    data: &Value,
    collection: &str,
    with_extrinsic: bool,
) -> Result<Vec<RecordPointer>, IndexerError> {
    let Some(rows) = data.get(collection).and_then(Value::as_array) else {
        return Err(IndexerError::Query)
            .attach_printable_lazy(|| format!("response is missing the `{collection}` rows"));
    };

    let mut pointers = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(block_number) = row.get("blockNumber").and_then(Value::as_u64) else {
            return Err(IndexerError::Query)
                .attach_printable_lazy(|| format!("row is missing `blockNumber`: {row}"));
        };

        let Some(index_in_block) = row.get("indexInBlock").and_then(Value::as_u64) else {
            return Err(IndexerError::Query)
                .attach_printable_lazy(|| format!("row is missing `indexInBlock`: {row}"));
        };

        let extrinsic_index = if with_extrinsic {
            row.get("extrinsic")
                .and_then(|extrinsic| extrinsic.get("indexInBlock"))
                .and_then(Value::as_u64)
                .map(|index| index as usize)
        } else {
            None
        };

        pointers.push(RecordPointer {
            block_number,
            index_in_block: index_in_block as usize,
            extrinsic_index,
        });
    }

    Ok(pointers)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use crate::filter::{FilterClause, Page};
    use crate::indexer::IndexerError;

    use super::{events_document, extrinsics_document, parse_pointers, RecordPointer};

    #[test]
    pub fn test_events_document() {
        let clauses = vec![
            FilterClause::int("blockNumber_gte", 100),
            FilterClause::str("palletName_eq", "Balances"),
        ];
        let page = Page {
            page_size: 5,
            page_number: 3,
        };

        assert_eq!(
            events_document(&clauses, &page),
            "query { events(orderBy: id_DESC, limit: 5, offset: 10, \
             where: {blockNumber_gte: 100, palletName_eq: \"Balances\"}) \
             { blockNumber indexInBlock extrinsic { indexInBlock } } }"
        );
    }

    #[test]
    pub fn test_extrinsics_document_with_no_clauses() {
        assert_eq!(
            extrinsics_document(&[], &Page::default()),
            "query { extrinsics(orderBy: id_DESC, limit: 10, offset: 0, where: {}) \
             { blockNumber indexInBlock } }"
        );
    }

    #[test]
    pub fn test_parse_event_pointers() {
        let data = json!({
            "events": [
                { "blockNumber": 101, "indexInBlock": 2, "extrinsic": { "indexInBlock": 1 } },
                { "blockNumber": 100, "indexInBlock": 0, "extrinsic": null },
            ]
        });

        let pointers = parse_pointers(&data, "events", true).unwrap();
        assert_eq!(
            pointers,
            vec![
                RecordPointer {
                    block_number: 101,
                    index_in_block: 2,
                    extrinsic_index: Some(1),
                },
                RecordPointer {
                    block_number: 100,
                    index_in_block: 0,
                    extrinsic_index: None,
                },
            ]
        );
    }

    #[test]
    pub fn test_parse_rejects_missing_rows() {
        let data = json!({ "something_else": [] });
        let report = parse_pointers(&data, "extrinsics", false).unwrap_err();
        assert_matches!(report.current_context(), IndexerError::Query);
    }

    #[test]
    pub fn test_parse_rejects_malformed_row() {
        let data = json!({ "extrinsics": [ { "blockNumber": 100 } ] });
        let report = parse_pointers(&data, "extrinsics", false).unwrap_err();
        assert_matches!(report.current_context(), IndexerError::Query);
    }
}
