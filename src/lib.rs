//! Parent Localizer - dependency-ordered localization of related records
//!
//! Before a record can be translated, every parent it is reachable through
//! must be translated too (or already be). This crate provides:
//! - A relation registry describing which child tables hang off which parents
//! - A resolver that walks a record's ancestor chain and batches the
//!   localization commands in dependency order
//! - Narrow collaborator traits for the record store, translation lookup and
//!   command execution, with an in-memory implementation

pub mod backend;
pub mod command;
pub mod config;
pub mod record;
pub mod relation_schema;
pub mod resolver;

pub use command::{Command, CommandBatch, ImplicitSet};
pub use record::{LanguageId, Record, RecordId, RecordKey};
pub use relation_schema::RelationSchemaRegistry;
pub use resolver::{RelationResolver, Resolution, ResolveError};
