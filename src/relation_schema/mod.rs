pub mod config;
pub mod errors;
pub mod registry;

pub use config::{AdditionalRelationDefinition, DefaultRelationDefinition, RelationRegistryConfig};
pub use errors::RelationSchemaError;
pub use registry::{
    AdditionalRelation, DefaultRelation, RelationSchemaRegistry, RelationSchemaRegistryBuilder,
    DEFAULT_CONTENT_TABLE,
};
