use thiserror::Error;

/// Error taxonomy for the pipeline. Collaborator failures keep their own
/// kinds so callers can tell "no results" from "service failure".
#[derive(Debug, Error)]
pub enum Error {
    #[error("Catalog format error: {0}")]
    CatalogFormat(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
