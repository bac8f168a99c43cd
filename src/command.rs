//! Localization commands and the per-call bookkeeping sets.
//!
//! - [`CommandBatch`]: `(table, id) → command`, at most one command per target
//! - [`ImplicitSet`]: records that become localized as a side effect of a
//!   parent's `inlineSynchronize` command
//! - [`VisitedSet`]: records already processed during one top-level call

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::record::{LanguageId, RecordId, RecordKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Translate this exact record.
    Localize { language: LanguageId },
    /// Translate the collection `field` of this record by synchronizing the given child ids.
    InlineSynchronize {
        field: String,
        language: LanguageId,
        ids: Vec<RecordId>,
    },
}

impl Command {
    pub fn localize(language: LanguageId) -> Self {
        Command::Localize { language }
    }

    pub fn inline_synchronize(
        field: impl Into<String>,
        language: LanguageId,
        ids: Vec<RecordId>,
    ) -> Self {
        Command::InlineSynchronize {
            field: field.into(),
            language,
            ids,
        }
    }

    /// Command-map form of this command, as consumed by the localization engine.
    pub fn to_command_value(&self) -> Value {
        match self {
            Command::Localize { language } => json!({ "localize": language }),
            Command::InlineSynchronize {
                field,
                language,
                ids,
            } => json!({
                "inlineLocalizeSynchronize": {
                    "field": field,
                    "language": language,
                    "ids": ids,
                }
            }),
        }
    }
}

/// Accumulated localization commands, keyed by target record.
///
/// Iteration follows insertion order so that the batch handed to the
/// localization engine lists ancestors before the records that depend on them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBatch {
    entries: IndexMap<RecordKey, Command>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch holding exactly one entry.
    pub fn single(key: RecordKey, command: Command) -> Self {
        let mut batch = CommandBatch::new();
        batch.entries.insert(key, command);
        batch
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Command> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &RecordKey) -> Option<&mut Command> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Install `command` for `key`, returning whatever was pending there.
    ///
    /// A replaced entry keeps its original position in the batch.
    pub fn insert(&mut self, key: RecordKey, command: Command) -> Option<Command> {
        self.entries.insert(key, command)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Command)> {
        self.entries.iter()
    }

    /// Nested command map: `{table: {id: command}}`.
    pub fn to_command_map(&self) -> Value {
        let mut tables: Map<String, Value> = Map::new();
        for (key, command) in &self.entries {
            let rows = tables
                .entry(key.table.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(rows) = rows {
                rows.insert(key.id.to_string(), command.to_command_value());
            }
        }
        Value::Object(tables)
    }
}

impl Serialize for CommandBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_command_map().serialize(serializer)
    }
}

/// Records localized as a side effect of another record's command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImplicitSet {
    tables: BTreeMap<String, BTreeSet<RecordId>>,
}

impl ImplicitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the record was not yet present.
    pub fn insert(&mut self, table: &str, id: RecordId) -> bool {
        self.tables.entry(table.to_string()).or_default().insert(id)
    }

    pub fn contains(&self, table: &str, id: RecordId) -> bool {
        self.tables
            .get(table)
            .is_some_and(|ids| ids.contains(&id))
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Records already processed during one top-level resolution call.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    tables: HashMap<String, HashSet<RecordId>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a record visited. Returns `false` if it already was.
    pub fn mark(&mut self, table: &str, id: RecordId) -> bool {
        match self.tables.get_mut(table) {
            Some(ids) => ids.insert(id),
            None => {
                self.tables.insert(table.to_string(), HashSet::from([id]));
                true
            }
        }
    }
}
