//! In-memory backend for tests and the command-line front end.
//!
//! Holds a small dataset of tables and rows, loadable from YAML or JSON:
//!
//! ```yaml
//! id_field: uid
//! tables:
//!   tt_content:
//!     language_field: sys_language_uid
//!     pointer_field: l18n_parent
//!     delete_field: deleted
//!     rows:
//!       - { uid: 10, sys_language_uid: 0, l18n_parent: 0 }
//!       - { uid: 11, sys_language_uid: 2, l18n_parent: 10 }
//! ```
//!
//! Executed command batches are appended to a journal instead of creating rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::errors::BackendError;
use super::{CommandFlusher, LocalizationOracle, RecordStore};
use crate::command::CommandBatch;
use crate::record::{LanguageId, Record, RecordId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryTable {
    #[serde(default)]
    pub language_field: Option<String>,
    #[serde(default)]
    pub pointer_field: Option<String>,
    /// Soft-delete flag column; rows with a truthy value are invisible
    #[serde(default)]
    pub delete_field: Option<String>,
    #[serde(default)]
    pub rows: Vec<Record>,
}

impl MemoryTable {
    /// A table carrying both a language and a translation pointer column.
    pub fn localizable(language_field: &str, pointer_field: &str) -> Self {
        MemoryTable {
            language_field: Some(language_field.to_string()),
            pointer_field: Some(pointer_field.to_string()),
            ..Default::default()
        }
    }

    pub fn with_delete_field(mut self, delete_field: &str) -> Self {
        self.delete_field = Some(delete_field.to_string());
        self
    }

    pub fn row(mut self, record: Record) -> Self {
        self.rows.push(record);
        self
    }

    fn is_deleted(&self, record: &Record) -> bool {
        let Some(field) = &self.delete_field else {
            return false;
        };
        match record.get(field) {
            Some(Value::Bool(flag)) => *flag,
            Some(_) => record.int(field).is_some_and(|v| v != 0),
            None => false,
        }
    }

    fn visible_rows(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().filter(|row| !self.is_deleted(row))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDataset {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub tables: BTreeMap<String, MemoryTable>,
}

fn default_id_field() -> String {
    "uid".to_string()
}

impl Default for MemoryDataset {
    fn default() -> Self {
        MemoryDataset {
            id_field: default_id_field(),
            tables: BTreeMap::new(),
        }
    }
}

impl MemoryDataset {
    /// Load a dataset; files ending in `.json` are read as JSON, everything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content).map_err(|e| BackendError::DatasetParse(e.to_string()))
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, BackendError> {
        serde_yaml::from_str(content).map_err(|e| BackendError::DatasetParse(e.to_string()))
    }
}

/// Dataset-backed oracle, store and journaling executor in one.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    dataset: MemoryDataset,
    journal: Mutex<Vec<CommandBatch>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: MemoryDataset) -> Self {
        MemoryBackend {
            dataset,
            journal: Mutex::new(Vec::new()),
        }
    }

    pub fn with_id_field(mut self, id_field: &str) -> Self {
        self.dataset.id_field = id_field.to_string();
        self
    }

    pub fn table(mut self, name: &str, table: MemoryTable) -> Self {
        self.dataset.tables.insert(name.to_string(), table);
        self
    }

    /// Add a row to an existing table, or to a new non-localizable one.
    pub fn insert_row(&mut self, table: &str, record: Record) {
        self.dataset
            .tables
            .entry(table.to_string())
            .or_default()
            .rows
            .push(record);
    }

    pub fn dataset(&self) -> &MemoryDataset {
        &self.dataset
    }

    /// Every batch executed so far, in execution order.
    pub fn executed(&self) -> Vec<CommandBatch> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn id_of(&self, record: &Record) -> Option<RecordId> {
        record.int(&self.dataset.id_field)
    }
}

impl LocalizationOracle for MemoryBackend {
    fn language_field(&self, table: &str) -> Option<String> {
        self.dataset.tables.get(table)?.language_field.clone()
    }

    fn translation_pointer_field(&self, table: &str) -> Option<String> {
        self.dataset.tables.get(table)?.pointer_field.clone()
    }

    /// Several translations of one record in one language are invalid data;
    /// the one with the lowest id is returned.
    fn find_localization(
        &self,
        table: &str,
        id: RecordId,
        language: LanguageId,
    ) -> Result<Option<Record>, BackendError> {
        let Some(schema) = self.dataset.tables.get(table) else {
            return Ok(None);
        };
        let (Some(language_field), Some(pointer_field)) =
            (&schema.language_field, &schema.pointer_field)
        else {
            return Ok(None);
        };

        let found = schema
            .visible_rows()
            .filter(|row| row.int(pointer_field) == Some(id))
            .filter(|row| row.int(language_field) == Some(i64::from(language)))
            .filter_map(|row| self.id_of(row).map(|row_id| (row_id, row)))
            .min_by_key(|(row_id, _)| *row_id)
            .map(|(_, row)| row.clone());
        Ok(found)
    }
}

impl RecordStore for MemoryBackend {
    fn fetch(&self, table: &str, id: RecordId) -> Result<Option<Record>, BackendError> {
        let Some(schema) = self.dataset.tables.get(table) else {
            return Ok(None);
        };
        Ok(schema
            .visible_rows()
            .find(|row| self.id_of(row) == Some(id))
            .cloned())
    }
}

impl CommandFlusher for MemoryBackend {
    fn execute(&self, batch: &CommandBatch) -> Result<(), BackendError> {
        log::debug!("Executing batch with {} command(s)", batch.len());
        self.journal
            .lock()
            .map_err(|_| BackendError::Execution("command journal poisoned".to_string()))?
            .push(batch.clone());
        Ok(())
    }
}
