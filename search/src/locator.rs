//! Block-time lookup.

use chrono::{DateTime, Utc};
use error_stack::{Result, ResultExt};
use serde_json::Value;
use tracing::debug;

use crate::filter::{render_clauses, FilterClause};
use crate::indexer::{Indexer, IndexerError};

/// Expected block production interval, in seconds.
pub const DEFAULT_BLOCK_TIME: u64 = 6;

pub(crate) fn blocks_document(timestamp: &str) -> String {
    let clauses = [FilterClause::str("timestamp_eq", timestamp)];
    format!(
        "query {{ blocks(where: {filter}) {{ height }} }}",
        filter = render_clauses(&clauses),
    )
}

/// Find the block produced at exactly `block_datetime`.
///
/// The instant is formatted with second precision and matched against the
/// squid's stored timestamp by exact equality. This is fragile by design:
/// if the stored timestamp does not fall precisely on a matching second
/// boundary, `None` is returned even though a nearby block exists. Callers
/// that need an approximate match must scan a tolerance window themselves.
///
/// `block_time` is the chain's expected block interval in seconds. It is
/// not used in matching; it is reserved for a future tolerance-window
/// search.
pub async fn search_block_number<I>(
    indexer: &I,
    block_datetime: DateTime<Utc>,
    block_time: u64,
) -> Result<Option<u64>, IndexerError>
where
    I: Indexer,
{
    let target_block_timestamp = block_datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    debug!(
        timestamp = %target_block_timestamp,
        block_time,
        "searching block by timestamp"
    );

    let document = blocks_document(&target_block_timestamp);
    let data = indexer.execute(&document).await?;

    let Some(rows) = data.get("blocks").and_then(Value::as_array) else {
        return Err(IndexerError::Query).attach_printable("response is missing the `blocks` rows");
    };

    match rows.first() {
        None => Ok(None),
        Some(row) => {
            let Some(height) = row.get("height").and_then(Value::as_u64) else {
                return Err(IndexerError::Query)
                    .attach_printable_lazy(|| format!("block row is missing `height`: {row}"));
            };
            Ok(Some(height))
        }
    }
}
