use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Args;
use error_stack::{Result, ResultExt};
use serde::Serialize;
use tracing::info;

use crate::error::SearchError;
use crate::filter::{EventCriteria, ExtrinsicCriteria};
use crate::locator;
use crate::service::SearchService;

use super::common::{IndexerArgs, NodeArgs, PageArgs};

#[derive(Args, Debug)]
pub struct FilterEventsArgs {
    #[clap(flatten)]
    indexer: IndexerArgs,
    #[clap(flatten)]
    node: NodeArgs,
    #[clap(flatten)]
    page: PageArgs,
    /// Only match events at or after this block.
    #[arg(long, env)]
    block_start: Option<u64>,
    /// Only match events at or before this block.
    #[arg(long, env)]
    block_end: Option<u64>,
    /// Pallet that emitted the event.
    #[arg(long, env)]
    pallet_name: Option<String>,
    /// Event name within the pallet.
    #[arg(long, env)]
    event_name: Option<String>,
    /// SS58 address appearing in the event arguments.
    #[arg(long, env)]
    account_id: Option<String>,
    /// Write the resolved events to a JSON file instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,
}

impl FilterEventsArgs {
    pub async fn run(self) -> Result<(), SearchError> {
        let service = SearchService::new(self.indexer.to_client()?, self.node.to_provider());

        let criteria = EventCriteria {
            block_start: self.block_start,
            block_end: self.block_end,
            pallet_name: self.pallet_name,
            event_name: self.event_name,
            account_id: self.account_id,
        };

        let events = service
            .filter_events(&criteria, &self.page.to_page())
            .await?;
        info!(count = events.len(), "resolved matching events");

        write_output(&events, self.json.as_deref())
    }
}

#[derive(Args, Debug)]
pub struct FilterExtrinsicsArgs {
    #[clap(flatten)]
    indexer: IndexerArgs,
    #[clap(flatten)]
    node: NodeArgs,
    #[clap(flatten)]
    page: PageArgs,
    /// Only match extrinsics at or after this block.
    #[arg(long, env)]
    block_start: Option<u64>,
    /// Only match extrinsics at or before this block.
    #[arg(long, env)]
    block_end: Option<u64>,
    /// Pallet of the extrinsic's main call.
    #[arg(long, env)]
    pallet_name: Option<String>,
    /// Call name within the pallet.
    #[arg(long, env)]
    call_name: Option<String>,
    /// SS58 address of the extrinsic signer.
    #[arg(long, env)]
    ss58_address: Option<String>,
    /// Write the resolved extrinsics to a JSON file instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,
}

impl FilterExtrinsicsArgs {
    pub async fn run(self) -> Result<(), SearchError> {
        let service = SearchService::new(self.indexer.to_client()?, self.node.to_provider());

        let criteria = ExtrinsicCriteria {
            block_start: self.block_start,
            block_end: self.block_end,
            pallet_name: self.pallet_name,
            call_name: self.call_name,
            ss58_address: self.ss58_address,
        };

        let extrinsics = service
            .filter_extrinsics(&criteria, &self.page.to_page())
            .await?;
        info!(count = extrinsics.len(), "resolved matching extrinsics");

        write_output(&extrinsics, self.json.as_deref())
    }
}

#[derive(Args, Debug)]
pub struct BlockAtArgs {
    #[clap(flatten)]
    indexer: IndexerArgs,
    /// UTC instant the block was produced at, e.g. 2020-07-12T00:00:00Z.
    #[arg(long, env)]
    block_datetime: DateTime<Utc>,
    /// Expected block interval in seconds. Reserved for tolerance search.
    #[arg(long, env, default_value = "6")]
    block_time: u64,
}

impl BlockAtArgs {
    pub async fn run(self) -> Result<(), SearchError> {
        let client = self.indexer.to_client()?;

        let height = locator::search_block_number(&client, self.block_datetime, self.block_time)
            .await
            .change_context(SearchError::Query)?;

        match height {
            Some(height) => println!("{height}"),
            None => info!(
                block_datetime = %self.block_datetime,
                "no block with exactly this timestamp"
            ),
        }

        Ok(())
    }
}

fn write_output<T>(records: &[T], path: Option<&Path>) -> Result<(), SearchError>
where
    T: Serialize,
{
    match path {
        Some(path) => {
            let file = File::create(path)
                .change_context(SearchError::Configuration)
                .attach_printable_lazy(|| format!("failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), records)
                .change_context(SearchError::Configuration)?;
        }
        None => {
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), records)
                .change_context(SearchError::Configuration)?;
            println!();
        }
    }

    Ok(())
}
