//! UNIMARC-style encoding of structured record fields.
//!
//! The encoder projects a [`RecordFields`] set onto a tag-keyed document:
//! control fields become plain strings, data fields become an indicator pair
//! plus a map of subfields whose codes are assigned by position.
//!
//! Encoding never fails. A field whose definition cannot be resolved is left
//! out of the document and reported in [`EncodeOutcome::skipped`]; a tag written
//! by both a control field and a data field is reported in
//! [`EncodeOutcome::collisions`] (the data field wins).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{
    definition::DefinitionSet,
    record::{ControlFieldInput, DataFieldInput, RecordFields},
};

/// Placeholder leader: status `n`, type `a`, level `m`, indicator and subfield
/// code lengths 2, ISBD cataloging form. Record length and base address are
/// not computed and stay at zero.
pub const UNIMARC_LEADER: &str = "00000nam  2200000 i 450 ";

/// Blank indicator sentinel
pub const BLANK_INDICATOR: char = ' ';

/// Subfield code for the i-th subfield of a data field (0-indexed).
///
/// Codes run `a..z` and wrap around after 26 subfields, so the 27th subfield
/// reuses code `a` and overwrites the first one in the encoded map.
pub fn code_for_index(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}

/// Indicator pair, each blank indicator replaced by a space
pub fn encode_indicators(ind1: &str, ind2: &str) -> String {
    let mut indicators = String::with_capacity(2);
    indicators.push(ind1.chars().next().unwrap_or(BLANK_INDICATOR));
    indicators.push(ind2.chars().next().unwrap_or(BLANK_INDICATOR));
    indicators
}

/// Encoded record document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UnimarcDocument {
    pub leader: String,
    #[schema(value_type = Object)]
    pub fields: IndexMap<String, FieldValue>,
}

/// Value stored under a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Control(String),
    Data(DataFieldValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DataFieldValue {
    pub indicators: String,
    #[schema(value_type = Object)]
    pub subfields: IndexMap<String, String>,
}

/// Which kind of field was involved in an encoding warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Control,
    Data,
}

/// Field left out of the document because its definition is unknown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedField {
    pub kind: FieldKind,
    /// Position of the field within its kind
    pub position: usize,
    pub definition_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EncodeOutcome {
    pub document: UnimarcDocument,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedField>,
    /// Tags written by both a control and a data field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<String>,
}

impl Default for UnimarcDocument {
    fn default() -> Self {
        Self {
            leader: UNIMARC_LEADER.to_string(),
            fields: IndexMap::new(),
        }
    }
}

impl UnimarcDocument {
    /// Subfield value of a data field, `None` for control fields or missing codes
    pub fn subfield(&self, tag: &str, code: char) -> Option<&str> {
        match self.fields.get(tag)? {
            FieldValue::Data(field) => field.subfields.get(&code.to_string()).map(String::as_str),
            FieldValue::Control(_) => None,
        }
    }

    /// Value of a control field
    pub fn control(&self, tag: &str) -> Option<&str> {
        match self.fields.get(tag)? {
            FieldValue::Control(value) => Some(value.as_str()),
            FieldValue::Data(_) => None,
        }
    }
}

impl EncodeOutcome {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.collisions.is_empty()
    }
}

/// Encode a structured field set.
///
/// Definitions carried inline by a field take precedence over `definitions`.
/// Control fields are written first, then data fields; within a kind the last
/// field with a given tag wins.
pub fn encode(fields: &RecordFields, definitions: &DefinitionSet) -> EncodeOutcome {
    let mut document = UnimarcDocument::default();
    let mut skipped = Vec::new();
    let mut collisions = Vec::new();

    for (position, field) in fields.control_fields.iter().enumerate() {
        let Some(tag) = control_tag(field, definitions) else {
            tracing::warn!(
                "Encoding: control field #{} has unknown definition {}, skipped",
                position,
                field.definition_id
            );
            skipped.push(SkippedField {
                kind: FieldKind::Control,
                position,
                definition_id: field.definition_id,
            });
            continue;
        };
        document
            .fields
            .insert(tag.to_string(), FieldValue::Control(field.value.clone()));
    }

    for (position, field) in fields.data_fields.iter().enumerate() {
        let Some(tag) = data_tag(field, definitions) else {
            tracing::warn!(
                "Encoding: data field #{} has unknown definition {}, skipped",
                position,
                field.definition_id
            );
            skipped.push(SkippedField {
                kind: FieldKind::Data,
                position,
                definition_id: field.definition_id,
            });
            continue;
        };

        let mut subfields = IndexMap::new();
        for (index, subfield) in field.subfields.iter().enumerate() {
            subfields.insert(code_for_index(index).to_string(), subfield.value.clone());
        }
        let value = FieldValue::Data(DataFieldValue {
            indicators: encode_indicators(&field.ind1, &field.ind2),
            subfields,
        });

        if let Some(FieldValue::Control(_)) = document.fields.insert(tag.to_string(), value) {
            tracing::warn!("Encoding: tag {} used by both a control and a data field", tag);
            if !collisions.iter().any(|t| t == tag) {
                collisions.push(tag.to_string());
            }
        }
    }

    EncodeOutcome {
        document,
        skipped,
        collisions,
    }
}

fn control_tag<'a>(field: &'a ControlFieldInput, definitions: &'a DefinitionSet) -> Option<&'a str> {
    field
        .definition
        .as_ref()
        .or_else(|| definitions.control(field.definition_id))
        .map(|d| d.tag.as_str())
}

fn data_tag<'a>(field: &'a DataFieldInput, definitions: &'a DefinitionSet) -> Option<&'a str> {
    field
        .definition
        .as_ref()
        .or_else(|| definitions.data(field.definition_id))
        .map(|d| d.tag.as_str())
}
