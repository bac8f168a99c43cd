use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::errors::RelationSchemaError;

/// Parent table used by default relations unless the registry names another one.
pub const DEFAULT_CONTENT_TABLE: &str = "tt_content";

/// The built-in relation of a child table to the content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultRelation {
    /// Column on the child table holding the parent's id
    pub parent_field: String,
    /// Column on the parent table through which children are edited collectively
    pub children_field: String,
}

/// An extra parent relation of a child table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalRelation {
    pub parent_table: String,
    pub parent_field: String,
    /// `None` when the relation is only navigable from the child side
    pub children_field: Option<String>,
}

/// Which relations each child table participates in as the many-side.
///
/// Built once, then shared read-only with every resolver.
#[derive(Debug, Clone, Serialize)]
pub struct RelationSchemaRegistry {
    content_table: String,
    default_relations: HashMap<String, DefaultRelation>,
    additional_relations: HashMap<String, Vec<AdditionalRelation>>,
}

impl Default for RelationSchemaRegistry {
    fn default() -> Self {
        RelationSchemaRegistry {
            content_table: DEFAULT_CONTENT_TABLE.to_string(),
            default_relations: HashMap::new(),
            additional_relations: HashMap::new(),
        }
    }
}

impl RelationSchemaRegistry {
    pub fn builder() -> RelationSchemaRegistryBuilder {
        RelationSchemaRegistryBuilder::default()
    }

    /// Fixed parent table of every default relation.
    pub fn content_table(&self) -> &str {
        &self.content_table
    }

    pub fn default_relation(&self, table: &str) -> Option<&DefaultRelation> {
        self.default_relations.get(table)
    }

    /// Additional relations of `table`, in registration order.
    pub fn additional_relations(&self, table: &str) -> &[AdditionalRelation] {
        self.additional_relations
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All child tables with at least one relation, sorted.
    pub fn child_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self
            .default_relations
            .keys()
            .chain(self.additional_relations.keys())
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        tables.sort_unstable();
        tables
    }

    pub fn default_relation_count(&self) -> usize {
        self.default_relations.len()
    }

    pub fn additional_relation_count(&self) -> usize {
        self.additional_relations.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
pub struct RelationSchemaRegistryBuilder {
    content_table: Option<String>,
    default_relations: Vec<(String, DefaultRelation)>,
    additional_relations: Vec<(String, AdditionalRelation)>,
}

impl RelationSchemaRegistryBuilder {
    pub fn content_table(mut self, table: impl Into<String>) -> Self {
        self.content_table = Some(table.into());
        self
    }

    /// Register the default relation of `child_table`. A later call for the
    /// same table replaces the earlier one.
    pub fn default_relation(
        mut self,
        child_table: impl Into<String>,
        parent_field: impl Into<String>,
        children_field: impl Into<String>,
    ) -> Self {
        self.default_relations.push((
            child_table.into(),
            DefaultRelation {
                parent_field: parent_field.into(),
                children_field: children_field.into(),
            },
        ));
        self
    }

    pub fn additional_relation(
        mut self,
        child_table: impl Into<String>,
        parent_table: impl Into<String>,
        parent_field: impl Into<String>,
        children_field: Option<&str>,
    ) -> Self {
        self.additional_relations.push((
            child_table.into(),
            AdditionalRelation {
                parent_table: parent_table.into(),
                parent_field: parent_field.into(),
                children_field: children_field.map(str::to_string),
            },
        ));
        self
    }

    /// Validate and freeze the registry.
    pub fn build(self) -> Result<RelationSchemaRegistry, RelationSchemaError> {
        let content_table = self
            .content_table
            .unwrap_or_else(|| DEFAULT_CONTENT_TABLE.to_string());
        if content_table.trim().is_empty() {
            return Err(RelationSchemaError::InvalidConfig {
                message: "content_table must not be empty".to_string(),
            });
        }

        let mut default_relations = HashMap::new();
        for (table, relation) in self.default_relations {
            require_name(&table, "child table", &table)?;
            require_name(&table, "parent_field", &relation.parent_field)?;
            require_name(&table, "children_field", &relation.children_field)?;
            default_relations.insert(table, relation);
        }

        let mut additional_relations: HashMap<String, Vec<AdditionalRelation>> = HashMap::new();
        for (table, relation) in self.additional_relations {
            require_name(&table, "child table", &table)?;
            require_name(&table, "parent_table", &relation.parent_table)?;
            require_name(&table, "parent_field", &relation.parent_field)?;
            if let Some(children_field) = &relation.children_field {
                require_name(&table, "children_field", children_field)?;
            }

            let relations = additional_relations.entry(table.clone()).or_default();
            let duplicate = relations.iter().any(|existing| {
                existing.parent_table == relation.parent_table
                    && existing.parent_field == relation.parent_field
            });
            if duplicate {
                return Err(RelationSchemaError::DuplicateRelation {
                    table,
                    parent_table: relation.parent_table,
                    parent_field: relation.parent_field,
                });
            }
            relations.push(relation);
        }

        Ok(RelationSchemaRegistry {
            content_table,
            default_relations,
            additional_relations,
        })
    }
}

fn require_name(table: &str, what: &'static str, value: &str) -> Result<(), RelationSchemaError> {
    if value.trim().is_empty() {
        return Err(RelationSchemaError::EmptyName {
            table: table.to_string(),
            what,
        });
    }
    Ok(())
}
