mod common;
mod search;

use clap::{Parser, Subcommand};
use error_stack::Result;

use crate::error::SearchError;

use self::search::{BlockAtArgs, FilterEventsArgs, FilterExtrinsicsArgs};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for events and resolve them on-chain.
    FilterEvents(FilterEventsArgs),
    /// Search for extrinsics and resolve them on-chain.
    FilterExtrinsics(FilterExtrinsicsArgs),
    /// Find the block produced at a given UTC instant.
    BlockAt(BlockAtArgs),
}

impl Cli {
    pub async fn run(self) -> Result<(), SearchError> {
        match self.command {
            Command::FilterEvents(args) => args.run().await,
            Command::FilterExtrinsics(args) => args.run().await,
            Command::BlockAt(args) => args.run().await,
        }
    }
}
