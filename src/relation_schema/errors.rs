//! # Relation Schema Error Types
//!
//! Errors raised while loading and validating relation registry definitions.
//! Resolution itself never produces these: a registry entry that points at a
//! missing table or column only shows up later as a skipped branch.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RelationSchemaError {
    #[error("Failed to read relation registry file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse relation registry: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid relation registry: {message}")]
    InvalidConfig { message: String },
    #[error("Empty {what} in relation registry entry for table `{table}`")]
    EmptyName { table: String, what: &'static str },
    #[error(
        "Duplicate additional relation for table `{table}`: parent `{parent_table}` via `{parent_field}`"
    )]
    DuplicateRelation {
        table: String,
        parent_table: String,
        parent_field: String,
    },
}
