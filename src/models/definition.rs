//! Field definitions (the tag catalog).
//!
//! Definitions are read-only for the record engine: they describe which tags
//! exist and how their indicators are labelled, and are resolved at runtime by id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Definition of a control field (plain value, no indicators or subfields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ControlFieldDefinition {
    pub id: i32,
    /// 3-character tag, e.g. "001"
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Definition of a data field (two indicators and ordered subfields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DataFieldDefinition {
    pub id: i32,
    /// 3-character tag, e.g. "200"
    pub tag: String,
    pub name: String,
    /// Label of the first indicator position
    pub ind1_name: Option<String>,
    /// Label of the second indicator position
    pub ind2_name: Option<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Definition matched by tag, whichever kind it is
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaggedDefinition {
    Control(ControlFieldDefinition),
    Data(DataFieldDefinition),
}

/// Full definition catalog as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DefinitionCatalog {
    pub control_fields: Vec<ControlFieldDefinition>,
    pub data_fields: Vec<DataFieldDefinition>,
}

/// In-memory lookup tables of both definition kinds, keyed by id
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    control: HashMap<i32, ControlFieldDefinition>,
    data: HashMap<i32, DataFieldDefinition>,
}

impl DefinitionSet {
    pub fn new(
        control: impl IntoIterator<Item = ControlFieldDefinition>,
        data: impl IntoIterator<Item = DataFieldDefinition>,
    ) -> Self {
        Self {
            control: control.into_iter().map(|d| (d.id, d)).collect(),
            data: data.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn control(&self, id: i32) -> Option<&ControlFieldDefinition> {
        self.control.get(&id)
    }

    pub fn data(&self, id: i32) -> Option<&DataFieldDefinition> {
        self.data.get(&id)
    }
}

impl From<DefinitionCatalog> for DefinitionSet {
    fn from(catalog: DefinitionCatalog) -> Self {
        DefinitionSet::new(catalog.control_fields, catalog.data_fields)
    }
}
