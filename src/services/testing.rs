//! In-memory record store used by service tests.
//!
//! Mirrors the foreign keys of the database schema: a data field cannot be
//! deleted while it still has subfields, and a record cannot be deleted while
//! anything still references it.

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    marc::UnimarcDocument,
    models::record::{ControlField, DataField, Subfield},
    repository::records::{
        ControlFieldUpdate, DataFieldUpdate, FieldGraph, NewControlField, NewDataField,
        NewSubfield, RecordWriter, SubfieldUpdate,
    },
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: i32,
    pub records: Vec<(i32, UnimarcDocument)>,
    pub control_fields: Vec<ControlField>,
    pub data_fields: Vec<DataField>,
    pub subfields: Vec<Subfield>,
    /// (id, record_id)
    pub holdings: Vec<(i32, i32)>,
    /// Every mutating call, in order
    pub writes: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    fn allocate(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_holding(&mut self, record_id: i32) -> i32 {
        let id = self.allocate();
        self.holdings.push((id, record_id));
        id
    }

    pub fn metadata(&self, record_id: i32) -> Option<&UnimarcDocument> {
        self.records
            .iter()
            .find(|(id, _)| *id == record_id)
            .map(|(_, metadata)| metadata)
    }

    fn foreign_key(table: &str, id: i32) -> AppError {
        AppError::Internal(format!("foreign key violation: {} {} still referenced", table, id))
    }
}

#[async_trait]
impl RecordWriter for MemoryStore {
    async fn lock_record(&mut self, record_id: i32) -> AppResult<Option<UnimarcDocument>> {
        Ok(self.metadata(record_id).cloned())
    }

    async fn load_fields(&mut self, record_id: i32) -> AppResult<FieldGraph> {
        let mut control: Vec<ControlField> = self
            .control_fields
            .iter()
            .filter(|f| f.record_id == record_id)
            .cloned()
            .collect();
        control.sort_by_key(|f| (f.position, f.id));

        let mut data: Vec<DataField> = self
            .data_fields
            .iter()
            .filter(|f| f.record_id == record_id)
            .cloned()
            .collect();
        data.sort_by_key(|f| (f.position, f.id));
        for field in &mut data {
            let mut subfields: Vec<Subfield> = self
                .subfields
                .iter()
                .filter(|s| s.data_field_id == field.id)
                .cloned()
                .collect();
            subfields.sort_by_key(|s| (s.position, s.id));
            field.subfields = subfields;
        }

        Ok((control, data))
    }

    async fn insert_record(&mut self, metadata: &UnimarcDocument) -> AppResult<i32> {
        let id = self.allocate();
        self.records.push((id, metadata.clone()));
        self.writes.push(format!("insert_record {}", id));
        Ok(id)
    }

    async fn update_metadata(&mut self, record_id: i32, metadata: &UnimarcDocument) -> AppResult<()> {
        let entry = self
            .records
            .iter_mut()
            .find(|(id, _)| *id == record_id)
            .ok_or_else(|| AppError::NotFound(format!("Record {} not found", record_id)))?;
        entry.1 = metadata.clone();
        self.writes.push(format!("update_metadata {}", record_id));
        Ok(())
    }

    async fn insert_control_field(&mut self, record_id: i32, field: &NewControlField) -> AppResult<i32> {
        let id = self.allocate();
        self.control_fields.push(ControlField {
            id,
            record_id,
            definition_id: field.definition_id,
            value: field.value.clone(),
            position: field.position,
            definition: None,
        });
        self.writes.push(format!("insert_control_field {}", id));
        Ok(id)
    }

    async fn update_control_field(&mut self, record_id: i32, field: &ControlFieldUpdate) -> AppResult<()> {
        let existing = self
            .control_fields
            .iter_mut()
            .find(|f| f.id == field.id && f.record_id == record_id)
            .ok_or_else(|| AppError::NotFound(format!("Control field {} not found", field.id)))?;
        existing.definition_id = field.definition_id;
        existing.value = field.value.clone();
        existing.position = field.position;
        self.writes.push(format!("update_control_field {}", field.id));
        Ok(())
    }

    async fn delete_control_fields(&mut self, record_id: i32, ids: &[i32]) -> AppResult<u64> {
        let before = self.control_fields.len();
        self.control_fields
            .retain(|f| !(f.record_id == record_id && ids.contains(&f.id)));
        self.writes.push(format!("delete_control_fields {:?}", ids));
        Ok((before - self.control_fields.len()) as u64)
    }

    async fn insert_data_field(&mut self, record_id: i32, field: &NewDataField) -> AppResult<i32> {
        let id = self.allocate();
        self.data_fields.push(DataField {
            id,
            record_id,
            definition_id: field.definition_id,
            ind1: field.ind1.clone(),
            ind2: field.ind2.clone(),
            position: field.position,
            definition: None,
            subfields: Vec::new(),
        });
        self.writes.push(format!("insert_data_field {}", id));
        for subfield in &field.subfields {
            self.insert_subfield(id, subfield).await?;
        }
        Ok(id)
    }

    async fn update_data_field(&mut self, record_id: i32, field: &DataFieldUpdate) -> AppResult<()> {
        let existing = self
            .data_fields
            .iter_mut()
            .find(|f| f.id == field.id && f.record_id == record_id)
            .ok_or_else(|| AppError::NotFound(format!("Data field {} not found", field.id)))?;
        existing.definition_id = field.definition_id;
        existing.ind1 = field.ind1.clone();
        existing.ind2 = field.ind2.clone();
        existing.position = field.position;
        self.writes.push(format!("update_data_field {}", field.id));
        Ok(())
    }

    async fn delete_data_fields(&mut self, record_id: i32, ids: &[i32]) -> AppResult<u64> {
        if let Some(orphan) = self.subfields.iter().find(|s| ids.contains(&s.data_field_id)) {
            return Err(Self::foreign_key("data_field", orphan.data_field_id));
        }
        let before = self.data_fields.len();
        self.data_fields
            .retain(|f| !(f.record_id == record_id && ids.contains(&f.id)));
        self.writes.push(format!("delete_data_fields {:?}", ids));
        Ok((before - self.data_fields.len()) as u64)
    }

    async fn insert_subfield(&mut self, data_field_id: i32, subfield: &NewSubfield) -> AppResult<i32> {
        if !self.data_fields.iter().any(|f| f.id == data_field_id) {
            return Err(AppError::NotFound(format!("Data field {} not found", data_field_id)));
        }
        let id = self.allocate();
        self.subfields.push(Subfield {
            id,
            data_field_id,
            value: subfield.value.clone(),
            position: subfield.position,
        });
        self.writes.push(format!("insert_subfield {}", id));
        Ok(id)
    }

    async fn update_subfield(&mut self, data_field_id: i32, subfield: &SubfieldUpdate) -> AppResult<()> {
        let existing = self
            .subfields
            .iter_mut()
            .find(|s| s.id == subfield.id && s.data_field_id == data_field_id)
            .ok_or_else(|| AppError::NotFound(format!("Subfield {} not found", subfield.id)))?;
        existing.value = subfield.value.clone();
        existing.position = subfield.position;
        self.writes.push(format!("update_subfield {}", subfield.id));
        Ok(())
    }

    async fn delete_subfields(&mut self, data_field_id: i32, ids: &[i32]) -> AppResult<u64> {
        let before = self.subfields.len();
        self.subfields
            .retain(|s| !(s.data_field_id == data_field_id && ids.contains(&s.id)));
        self.writes.push(format!("delete_subfields {:?}", ids));
        Ok((before - self.subfields.len()) as u64)
    }

    async fn delete_subfields_of(&mut self, data_field_ids: &[i32]) -> AppResult<u64> {
        let before = self.subfields.len();
        self.subfields
            .retain(|s| !data_field_ids.contains(&s.data_field_id));
        self.writes.push(format!("delete_subfields_of {:?}", data_field_ids));
        Ok((before - self.subfields.len()) as u64)
    }

    async fn delete_record_subfields(&mut self, record_id: i32) -> AppResult<u64> {
        let owned: Vec<i32> = self
            .data_fields
            .iter()
            .filter(|f| f.record_id == record_id)
            .map(|f| f.id)
            .collect();
        let before = self.subfields.len();
        self.subfields.retain(|s| !owned.contains(&s.data_field_id));
        self.writes.push(format!("delete_record_subfields {}", record_id));
        Ok((before - self.subfields.len()) as u64)
    }

    async fn delete_record_data_fields(&mut self, record_id: i32) -> AppResult<u64> {
        let owned: Vec<i32> = self
            .data_fields
            .iter()
            .filter(|f| f.record_id == record_id)
            .map(|f| f.id)
            .collect();
        if let Some(orphan) = self.subfields.iter().find(|s| owned.contains(&s.data_field_id)) {
            return Err(Self::foreign_key("data_field", orphan.data_field_id));
        }
        let before = self.data_fields.len();
        self.data_fields.retain(|f| f.record_id != record_id);
        self.writes.push(format!("delete_record_data_fields {}", record_id));
        Ok((before - self.data_fields.len()) as u64)
    }

    async fn delete_record_control_fields(&mut self, record_id: i32) -> AppResult<u64> {
        let before = self.control_fields.len();
        self.control_fields.retain(|f| f.record_id != record_id);
        self.writes.push(format!("delete_record_control_fields {}", record_id));
        Ok((before - self.control_fields.len()) as u64)
    }

    async fn delete_record_holdings(&mut self, record_id: i32) -> AppResult<u64> {
        let before = self.holdings.len();
        self.holdings.retain(|(_, owner)| *owner != record_id);
        self.writes.push(format!("delete_record_holdings {}", record_id));
        Ok((before - self.holdings.len()) as u64)
    }

    async fn delete_record(&mut self, record_id: i32) -> AppResult<u64> {
        let referenced = self.control_fields.iter().any(|f| f.record_id == record_id)
            || self.data_fields.iter().any(|f| f.record_id == record_id)
            || self.holdings.iter().any(|(_, owner)| *owner == record_id);
        if referenced {
            return Err(Self::foreign_key("record", record_id));
        }
        let before = self.records.len();
        self.records.retain(|(id, _)| *id != record_id);
        self.writes.push(format!("delete_record {}", record_id));
        Ok((before - self.records.len()) as u64)
    }
}
