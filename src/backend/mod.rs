//! Narrow interfaces to the systems the resolver consults but does not own.
//!
//! The resolver reads through [`LocalizationOracle`] and [`RecordStore`] and
//! writes through [`CommandFlusher`] only when a pending command must be
//! replaced mid-walk. Visibility rules (soft-deletes, workspaces) are the
//! store's business.

pub mod errors;
pub mod memory;

pub use errors::BackendError;
pub use memory::{MemoryBackend, MemoryDataset, MemoryTable};

use crate::command::CommandBatch;
use crate::record::{LanguageId, Record, RecordId};

/// Schema introspection plus lookup of existing translations.
#[cfg_attr(test, mockall::automock)]
pub trait LocalizationOracle {
    /// Column holding a record's language, if the table has one.
    fn language_field(&self, table: &str) -> Option<String>;

    /// Column pointing from a translation to its source record, if the table has one.
    fn translation_pointer_field(&self, table: &str) -> Option<String>;

    /// The existing translation of `(table, id)` in `language`, if any.
    fn find_localization(
        &self,
        table: &str,
        id: RecordId,
        language: LanguageId,
    ) -> Result<Option<Record>, BackendError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RecordStore {
    /// The full row of `(table, id)`, or `None` if it no longer exists or is not visible.
    fn fetch(&self, table: &str, id: RecordId) -> Result<Option<Record>, BackendError>;
}

/// Executes commands against the localization engine.
#[cfg_attr(test, mockall::automock)]
pub trait CommandFlusher {
    /// Execute every entry of `batch` synchronously. Once this returns `Ok`
    /// the entries are committed.
    fn execute(&self, batch: &CommandBatch) -> Result<(), BackendError>;
}
