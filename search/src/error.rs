#[derive(Debug)]
pub enum SearchError {
    Configuration,
    Filter,
    Query,
    Resolve,
}

impl error_stack::Context for SearchError {}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Configuration => write!(f, "squidsearch: configuration error"),
            SearchError::Filter => write!(f, "squidsearch: failed to build search filter"),
            SearchError::Query => write!(f, "squidsearch: search query failed"),
            SearchError::Resolve => write!(f, "squidsearch: failed to resolve search results"),
        }
    }
}
