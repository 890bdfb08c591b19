//! Data models for the Elidune record engine

pub mod definition;
pub mod record;
pub mod template;

// Re-export commonly used types
pub use definition::{ControlFieldDefinition, DataFieldDefinition, DefinitionSet};
pub use record::{ControlField, DataField, Record, RecordFields, RecordShort, Subfield};
pub use template::Template;
