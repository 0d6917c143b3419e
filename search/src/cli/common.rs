use std::time::Duration;

use clap::Args;
use error_stack::{Result, ResultExt};

use crate::error::SearchError;
use crate::filter::Page;
use crate::indexer::{GraphqlClient, GraphqlClientOptions};
use crate::provider::{SidecarProvider, SidecarProviderOptions};

#[derive(Args, Debug, Clone)]
pub struct IndexerArgs {
    /// Squid GraphQL endpoint URL.
    #[arg(long, env)]
    pub squid_url: String,
    /// Squid request timeout, in seconds.
    #[arg(long, env, default_value = "30")]
    pub squid_timeout: u64,
}

impl IndexerArgs {
    pub fn to_client(&self) -> Result<GraphqlClient, SearchError> {
        let url = self
            .squid_url
            .parse::<url::Url>()
            .change_context(SearchError::Configuration)
            .attach_printable_lazy(|| format!("invalid squid url: {}", self.squid_url))?;

        let options = GraphqlClientOptions {
            timeout: Duration::from_secs(self.squid_timeout),
            ..Default::default()
        };

        Ok(GraphqlClient::new(url, options))
    }
}

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// Substrate API Sidecar endpoint URL.
    #[arg(long, env)]
    pub sidecar_url: String,
    /// Sidecar request timeout, in seconds.
    #[arg(long, env, default_value = "30")]
    pub sidecar_timeout: u64,
}

impl NodeArgs {
    pub fn to_provider(&self) -> SidecarProvider {
        let options = SidecarProviderOptions {
            timeout: Duration::from_secs(self.sidecar_timeout),
            ..Default::default()
        };

        SidecarProvider::new(&self.sidecar_url, options)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Number of results per page.
    #[arg(long, env, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: u64,
    /// Page to return, 1-indexed.
    #[arg(long, env, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub page_number: u64,
}

impl PageArgs {
    pub fn to_page(&self) -> Page {
        Page {
            page_size: self.page_size,
            page_number: self.page_number,
        }
    }
}
