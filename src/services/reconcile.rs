//! Record reconciliation.
//!
//! Reconciling a record compares its persisted field graph with a complete
//! desired field set and writes only the difference:
//!
//! - desired item with an id: update the persisted item in place
//! - desired item without an id: create it
//! - persisted item absent from the desired set: delete it
//!
//! The set logic ([`diff`], [`plan_reconciliation`]) is pure; [`apply_plan`]
//! and [`reconcile_in`] run the resulting writes against a [`RecordWriter`]
//! that holds the caller's transaction.

use std::collections::{HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    marc::{encode, EncodeOutcome},
    models::{
        definition::DefinitionSet,
        record::{
            ControlField, ControlFieldInput, DataField, DataFieldInput, RecordFields, Subfield,
            SubfieldInput,
        },
    },
    repository::records::{
        ControlFieldUpdate, DataFieldUpdate, NewControlField, NewDataField, NewSubfield,
        RecordWriter, SubfieldUpdate,
    },
};

/// Item already persisted, identified by its id
pub trait Persisted {
    fn id(&self) -> i32;
}

/// Item of a desired set, optionally carrying the id of a persisted item
pub trait Desired {
    fn id(&self) -> Option<i32>;
}

impl Persisted for ControlField {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Persisted for DataField {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Persisted for Subfield {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Desired for ControlFieldInput {
    fn id(&self) -> Option<i32> {
        self.id
    }
}

impl Desired for DataFieldInput {
    fn id(&self) -> Option<i32> {
        self.id
    }
}

impl Desired for SubfieldInput {
    fn id(&self) -> Option<i32> {
        self.id
    }
}

/// Classification of a desired set against persisted items.
/// Positions are indexes in the desired set.
#[derive(Debug)]
pub struct Diff<'a, P, D> {
    pub to_create: Vec<(i32, &'a D)>,
    pub to_update: Vec<(i32, &'a P, &'a D)>,
    pub to_delete: Vec<i32>,
    /// Desired ids matching no persisted item
    pub unknown: Vec<i32>,
    /// Ids listed more than once in the desired set
    pub duplicates: Vec<i32>,
}

pub fn diff<'a, P: Persisted, D: Desired>(persisted: &'a [P], desired: &'a [D]) -> Diff<'a, P, D> {
    let by_id: HashMap<i32, &P> = persisted.iter().map(|p| (p.id(), p)).collect();
    let mut kept: HashSet<i32> = HashSet::new();

    let mut result = Diff {
        to_create: Vec::new(),
        to_update: Vec::new(),
        to_delete: Vec::new(),
        unknown: Vec::new(),
        duplicates: Vec::new(),
    };

    for (index, item) in desired.iter().enumerate() {
        let position = index as i32;
        match item.id() {
            Some(id) => {
                if !kept.insert(id) {
                    result.duplicates.push(id);
                    continue;
                }
                match by_id.get(&id) {
                    Some(current) => result.to_update.push((position, *current, item)),
                    None => result.unknown.push(id),
                }
            }
            None => result.to_create.push((position, item)),
        }
    }

    result.to_delete = persisted
        .iter()
        .map(Persisted::id)
        .filter(|id| !kept.contains(id))
        .collect();

    result
}

/// Subfield writes for one data field that already exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubfieldChanges {
    pub data_field_id: i32,
    pub deletes: Vec<i32>,
    pub updates: Vec<SubfieldUpdate>,
    pub creates: Vec<NewSubfield>,
}

impl SubfieldChanges {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.creates.is_empty()
    }

    fn len(&self) -> usize {
        self.deletes.len() + self.updates.len() + self.creates.len()
    }
}

/// Minimal set of writes turning the persisted graph into the desired one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub control_deletes: Vec<i32>,
    pub control_updates: Vec<ControlFieldUpdate>,
    pub control_creates: Vec<NewControlField>,
    pub data_deletes: Vec<i32>,
    pub data_updates: Vec<DataFieldUpdate>,
    pub subfield_changes: Vec<SubfieldChanges>,
    pub data_creates: Vec<NewDataField>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of row-level operations (bulk deletes count each row)
    pub fn len(&self) -> usize {
        self.control_deletes.len()
            + self.control_updates.len()
            + self.control_creates.len()
            + self.data_deletes.len()
            + self.data_updates.len()
            + self.subfield_changes.iter().map(SubfieldChanges::len).sum::<usize>()
            + self.data_creates.len()
    }
}

/// Plan the writes needed to reach `desired` from the persisted fields.
///
/// Updates are only planned for items whose stored values differ. A desired id
/// that does not belong to the record is rejected with `NotFound`, an id listed
/// twice with `Validation`.
pub fn plan_reconciliation(
    control_fields: &[ControlField],
    data_fields: &[DataField],
    desired: &RecordFields,
) -> AppResult<ReconcilePlan> {
    let mut plan = ReconcilePlan::default();

    let control = diff(control_fields, &desired.control_fields);
    if let Some(id) = control.duplicates.first() {
        return Err(AppError::Validation(format!(
            "Control field {} is listed more than once",
            id
        )));
    }
    if let Some(id) = control.unknown.first() {
        return Err(AppError::NotFound(format!(
            "Control field {} does not belong to this record",
            id
        )));
    }
    plan.control_deletes = control.to_delete;
    for (position, current, wanted) in control.to_update {
        if current.definition_id != wanted.definition_id
            || current.value != wanted.value
            || current.position != position
        {
            plan.control_updates.push(ControlFieldUpdate {
                id: current.id,
                definition_id: wanted.definition_id,
                value: wanted.value.clone(),
                position,
            });
        }
    }
    plan.control_creates = control
        .to_create
        .into_iter()
        .map(|(position, wanted)| NewControlField {
            definition_id: wanted.definition_id,
            value: wanted.value.clone(),
            position,
        })
        .collect();

    let data = diff(data_fields, &desired.data_fields);
    if let Some(id) = data.duplicates.first() {
        return Err(AppError::Validation(format!(
            "Data field {} is listed more than once",
            id
        )));
    }
    if let Some(id) = data.unknown.first() {
        return Err(AppError::NotFound(format!(
            "Data field {} does not belong to this record",
            id
        )));
    }
    plan.data_deletes = data.to_delete;
    for (position, current, wanted) in data.to_update {
        if current.definition_id != wanted.definition_id
            || current.ind1 != wanted.ind1
            || current.ind2 != wanted.ind2
            || current.position != position
        {
            plan.data_updates.push(DataFieldUpdate {
                id: current.id,
                definition_id: wanted.definition_id,
                ind1: wanted.ind1.clone(),
                ind2: wanted.ind2.clone(),
                position,
            });
        }

        let changes = plan_subfields(current, &wanted.subfields)?;
        if !changes.is_empty() {
            plan.subfield_changes.push(changes);
        }
    }
    plan.data_creates = data
        .to_create
        .into_iter()
        .map(|(position, wanted)| NewDataField {
            definition_id: wanted.definition_id,
            ind1: wanted.ind1.clone(),
            ind2: wanted.ind2.clone(),
            position,
            subfields: new_subfields(&wanted.subfields),
        })
        .collect();

    Ok(plan)
}

fn plan_subfields(field: &DataField, desired: &[SubfieldInput]) -> AppResult<SubfieldChanges> {
    let subfields = diff(&field.subfields, desired);
    if let Some(id) = subfields.duplicates.first() {
        return Err(AppError::Validation(format!(
            "Subfield {} is listed more than once in data field {}",
            id, field.id
        )));
    }
    if let Some(id) = subfields.unknown.first() {
        return Err(AppError::NotFound(format!(
            "Subfield {} does not belong to data field {}",
            id, field.id
        )));
    }

    let updates = subfields
        .to_update
        .into_iter()
        .filter(|(position, current, wanted)| {
            current.value != wanted.value || current.position != *position
        })
        .map(|(position, current, wanted)| SubfieldUpdate {
            id: current.id,
            value: wanted.value.clone(),
            position,
        })
        .collect();

    let creates = subfields
        .to_create
        .into_iter()
        .map(|(position, wanted)| NewSubfield {
            value: wanted.value.clone(),
            position,
        })
        .collect();

    Ok(SubfieldChanges {
        data_field_id: field.id,
        deletes: subfields.to_delete,
        updates,
        creates,
    })
}

/// Subfields of a new data field, positioned in submission order
pub fn new_subfields(desired: &[SubfieldInput]) -> Vec<NewSubfield> {
    desired
        .iter()
        .enumerate()
        .map(|(index, subfield)| NewSubfield {
            value: subfield.value.clone(),
            position: index as i32,
        })
        .collect()
}

/// Run a plan inside the writer's transaction.
///
/// Subfields of removed data fields are deleted before the data fields themselves.
pub async fn apply_plan<W: RecordWriter + ?Sized>(
    tx: &mut W,
    record_id: i32,
    plan: &ReconcilePlan,
) -> AppResult<()> {
    if !plan.control_deletes.is_empty() {
        tx.delete_control_fields(record_id, &plan.control_deletes).await?;
    }
    for update in &plan.control_updates {
        tx.update_control_field(record_id, update).await?;
    }
    for field in &plan.control_creates {
        tx.insert_control_field(record_id, field).await?;
    }

    if !plan.data_deletes.is_empty() {
        tx.delete_subfields_of(&plan.data_deletes).await?;
        tx.delete_data_fields(record_id, &plan.data_deletes).await?;
    }
    for update in &plan.data_updates {
        tx.update_data_field(record_id, update).await?;
    }
    for changes in &plan.subfield_changes {
        if !changes.deletes.is_empty() {
            tx.delete_subfields(changes.data_field_id, &changes.deletes).await?;
        }
        for update in &changes.updates {
            tx.update_subfield(changes.data_field_id, update).await?;
        }
        for subfield in &changes.creates {
            tx.insert_subfield(changes.data_field_id, subfield).await?;
        }
    }
    for field in &plan.data_creates {
        tx.insert_data_field(record_id, field).await?;
    }

    Ok(())
}

/// Give desired items without an inline definition the definition of the
/// persisted item they update, when both point at the same definition.
pub fn merge_persisted_definitions(
    desired: &RecordFields,
    control_fields: &[ControlField],
    data_fields: &[DataField],
) -> RecordFields {
    let control: HashMap<i32, &ControlField> = control_fields.iter().map(|f| (f.id, f)).collect();
    let data: HashMap<i32, &DataField> = data_fields.iter().map(|f| (f.id, f)).collect();

    let mut merged = desired.clone();
    for field in &mut merged.control_fields {
        if field.definition.is_some() {
            continue;
        }
        if let Some(current) = field.id.and_then(|id| control.get(&id)) {
            if current.definition_id == field.definition_id {
                field.definition = current.definition.clone();
            }
        }
    }
    for field in &mut merged.data_fields {
        if field.definition.is_some() {
            continue;
        }
        if let Some(current) = field.id.and_then(|id| data.get(&id)) {
            if current.definition_id == field.definition_id {
                field.definition = current.definition.clone();
            }
        }
    }
    merged
}

/// What a reconciliation did
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub plan: ReconcilePlan,
    pub metadata_rewritten: bool,
    pub encoding: EncodeOutcome,
}

/// Reconcile a record inside the writer's transaction.
///
/// Locks the record (NotFound when absent), re-encodes the desired fields into
/// its metadata, then applies the minimal field/subfield writes. Nothing is
/// written when the desired set matches the persisted state.
pub async fn reconcile_in<W: RecordWriter + ?Sized>(
    tx: &mut W,
    record_id: i32,
    desired: &RecordFields,
    definitions: &DefinitionSet,
) -> AppResult<ReconcileReport> {
    let current_metadata = tx
        .lock_record(record_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", record_id)))?;

    let (mut control_fields, mut data_fields) = tx.load_fields(record_id).await?;
    for field in &mut control_fields {
        if field.definition.is_none() {
            field.definition = definitions.control(field.definition_id).cloned();
        }
    }
    for field in &mut data_fields {
        if field.definition.is_none() {
            field.definition = definitions.data(field.definition_id).cloned();
        }
    }

    let plan = plan_reconciliation(&control_fields, &data_fields, desired)?;
    let merged = merge_persisted_definitions(desired, &control_fields, &data_fields);
    let encoding = encode(&merged, definitions);

    let metadata_rewritten = !plan.is_empty() || encoding.document != current_metadata;
    if metadata_rewritten {
        tx.update_metadata(record_id, &encoding.document).await?;
    }

    tracing::debug!(
        "Reconcile record {}: {} field operation(s), metadata rewritten: {}",
        record_id,
        plan.len(),
        metadata_rewritten
    );

    apply_plan(tx, record_id, &plan).await?;

    Ok(ReconcileReport {
        plan,
        metadata_rewritten,
        encoding,
    })
}
