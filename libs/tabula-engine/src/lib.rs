pub mod config;
pub mod error;
pub mod registry;
pub mod schema;

pub use config::{FieldConfig, SchemaConfig};
pub use error::SchemaError;
pub use registry::ConverterRegistry;
pub use schema::{RecordSchema, SchemaBuilder};
