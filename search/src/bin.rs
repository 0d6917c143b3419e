use clap::Parser;
use error_stack::{Result, ResultExt};
use squidsearch::{cli::Cli, SearchError};
use squidsearch_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), SearchError> {
    // Load .env before clap reads env-backed arguments.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    init_tracing()
        .change_context(SearchError::Configuration)
        .attach_printable("failed to initialize tracing")?;

    args.run().await
}
