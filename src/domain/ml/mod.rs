pub mod feature_registry;
pub mod feature_schema;
