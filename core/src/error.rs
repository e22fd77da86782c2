use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// No document has been indexed yet (N == 0).
    #[error("index is empty, no documents have been indexed")]
    IndexNotReady,
    #[error("query contains no valid terms")]
    NoValidTerms,
    /// Boolean AND cannot match: the first query term absent from the dictionary.
    #[error("term '{term}' not found in index, no results possible")]
    MissingTerm { term: String },
}
