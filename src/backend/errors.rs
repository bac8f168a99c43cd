use thiserror::Error;

/// Failures reported by the record store, the localization oracle or the
/// command executor.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Query on table `{table}` failed: {message}")]
    Query { table: String, message: String },
    #[error("Command execution failed: {0}")]
    Execution(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to read dataset: {0}")]
    DatasetRead(#[from] std::io::Error),
    #[error("Failed to parse dataset: {0}")]
    DatasetParse(String),
}
