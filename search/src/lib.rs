pub mod cli;
pub mod error;
pub mod filter;
pub mod indexer;
pub mod locator;
pub mod provider;
pub mod query;
pub mod resolver;
pub mod service;
pub mod ss58;

pub use error::SearchError;
pub use service::SearchService;
