//! Bibliographic record model.
//!
//! A record is self-describing: instead of fixed columns it owns an ordered list
//! of control fields and data fields, each pointing at a definition (tag) that is
//! resolved at runtime. The `metadata` column carries the UNIMARC-style
//! encoding of those fields and is rewritten on every create and update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::definition::{ControlFieldDefinition, DataFieldDefinition, DefinitionSet};
use crate::marc::UnimarcDocument;

/// Full record with its field graph
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Record {
    pub id: i32,
    pub metadata: UnimarcDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub control_fields: Vec<ControlField>,
    #[serde(default)]
    pub data_fields: Vec<DataField>,
}

/// Persisted control field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ControlField {
    pub id: i32,
    pub record_id: i32,
    pub definition_id: i32,
    pub value: String,
    pub position: i32,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ControlFieldDefinition>,
}

/// Persisted data field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DataField {
    pub id: i32,
    pub record_id: i32,
    pub definition_id: i32,
    pub ind1: String,
    pub ind2: String,
    pub position: i32,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<DataFieldDefinition>,
    #[sqlx(skip)]
    #[serde(default)]
    pub subfields: Vec<Subfield>,
}

/// Persisted subfield. Its position decides the code it is encoded with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subfield {
    pub id: i32,
    pub data_field_id: i32,
    pub value: String,
    pub position: i32,
}

/// Record summary for listings, read from the encoded metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordShort {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =========================================================================
// Desired state (drafts, create and update payloads)
// =========================================================================

/// Control field as submitted by the editing surface.
/// Without `id` it is a new field; with `id` it updates the persisted one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ControlFieldInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub definition_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ControlFieldDefinition>,
    #[serde(default)]
    pub value: String,
}

/// Data field as submitted by the editing surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DataFieldInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub definition_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<DataFieldDefinition>,
    #[serde(default)]
    pub ind1: String,
    #[serde(default)]
    pub ind2: String,
    #[serde(default)]
    pub subfields: Vec<SubfieldInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubfieldInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default)]
    pub value: String,
}

/// Complete structured field set of a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordFields {
    #[serde(default)]
    pub control_fields: Vec<ControlFieldInput>,
    #[serde(default)]
    pub data_fields: Vec<DataFieldInput>,
}

/// Create record request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateRecord {
    /// Seed the fields from this template when no field is given
    pub template_id: Option<i32>,
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl Record {
    /// Fill the inline definition of every field from the catalog
    pub fn attach_definitions(&mut self, definitions: &DefinitionSet) {
        for field in &mut self.control_fields {
            field.definition = definitions.control(field.definition_id).cloned();
        }
        for field in &mut self.data_fields {
            field.definition = definitions.data(field.definition_id).cloned();
        }
    }
}

impl RecordFields {
    pub fn is_empty(&self) -> bool {
        self.control_fields.is_empty() && self.data_fields.is_empty()
    }
}

impl From<&ControlField> for ControlFieldInput {
    fn from(field: &ControlField) -> Self {
        Self {
            id: Some(field.id),
            definition_id: field.definition_id,
            definition: field.definition.clone(),
            value: field.value.clone(),
        }
    }
}

impl From<&DataField> for DataFieldInput {
    fn from(field: &DataField) -> Self {
        Self {
            id: Some(field.id),
            definition_id: field.definition_id,
            definition: field.definition.clone(),
            ind1: field.ind1.clone(),
            ind2: field.ind2.clone(),
            subfields: field
                .subfields
                .iter()
                .map(|sf| SubfieldInput {
                    id: Some(sf.id),
                    value: sf.value.clone(),
                })
                .collect(),
        }
    }
}
