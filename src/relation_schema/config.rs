use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::errors::RelationSchemaError;
use super::registry::{RelationSchemaRegistry, DEFAULT_CONTENT_TABLE};

/// Relation registries are defined in YAML with the following structure:
///
/// ```yaml
/// content_table: tt_content        # Parent table of every default relation
/// default_relations:               # At most one per child table
///   tx_gallery_item:
///     parent_field: tt_content_ref   # Child column holding the parent's id
///     children_field: gallery_items  # Parent column listing the children
/// additional_relations:            # Any number per child table, in priority order
///   tx_gallery_item:
///     - parent_table: pages
///       parent_field: page_ref
///       children_field: gallery      # Optional
/// ```
///
/// # Usage
///
/// ```ignore
/// use parent_localizer::relation_schema::RelationRegistryConfig;
///
/// let registry = RelationRegistryConfig::from_yaml_file("relations.yaml")?.to_registry()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRegistryConfig {
    #[serde(default = "default_content_table")]
    pub content_table: String,
    #[serde(default)]
    pub default_relations: BTreeMap<String, DefaultRelationDefinition>,
    #[serde(default)]
    pub additional_relations: BTreeMap<String, Vec<AdditionalRelationDefinition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefaultRelationDefinition {
    pub parent_field: String,
    pub children_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdditionalRelationDefinition {
    pub parent_table: String,
    pub parent_field: String,
    #[serde(default)]
    pub children_field: Option<String>,
}

fn default_content_table() -> String {
    DEFAULT_CONTENT_TABLE.to_string()
}

impl Default for RelationRegistryConfig {
    fn default() -> Self {
        RelationRegistryConfig {
            content_table: default_content_table(),
            default_relations: BTreeMap::new(),
            additional_relations: BTreeMap::new(),
        }
    }
}

impl RelationRegistryConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, RelationSchemaError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RelationSchemaError::ConfigReadError {
                error: format!("{}: {}", path.as_ref().display(), e),
            }
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            RelationSchemaError::ConfigParseError { error } => {
                RelationSchemaError::ConfigParseError {
                    error: format!("{}: {}", path.as_ref().display(), error),
                }
            }
            other => other,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, RelationSchemaError> {
        serde_yaml::from_str(content).map_err(|e| RelationSchemaError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Validate the definitions and build the immutable registry.
    pub fn to_registry(&self) -> Result<RelationSchemaRegistry, RelationSchemaError> {
        let mut builder = RelationSchemaRegistry::builder().content_table(&self.content_table);

        for (table, relation) in &self.default_relations {
            builder = builder.default_relation(
                table,
                &relation.parent_field,
                &relation.children_field,
            );
        }

        for (table, relations) in &self.additional_relations {
            for relation in relations {
                builder = builder.additional_relation(
                    table,
                    &relation.parent_table,
                    &relation.parent_field,
                    relation.children_field.as_deref(),
                );
            }
        }

        builder.build()
    }
}
