//! Field seeding from templates

use crate::models::{
    record::{ControlFieldInput, DataFieldInput, RecordFields, SubfieldInput},
    template::Template,
};

/// Blank field drafts for a new record.
///
/// Every control field starts with an empty value and every data field with
/// the template's default indicators (empty when unset) and exactly one empty
/// subfield. An absent template yields no drafts.
pub fn seed_drafts(template: Option<&Template>) -> RecordFields {
    let Some(template) = template else {
        return RecordFields::default();
    };

    let control_fields = template
        .control_fields
        .iter()
        .map(|entry| ControlFieldInput {
            definition_id: entry.definition_id,
            ..Default::default()
        })
        .collect();

    let data_fields = template
        .data_fields
        .iter()
        .map(|entry| DataFieldInput {
            definition_id: entry.definition_id,
            ind1: entry.default_ind1.clone().unwrap_or_default(),
            ind2: entry.default_ind2.clone().unwrap_or_default(),
            subfields: vec![SubfieldInput::default()],
            ..Default::default()
        })
        .collect();

    RecordFields {
        control_fields,
        data_fields,
    }
}
