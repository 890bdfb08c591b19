//! Record service: creation, reads, reconciliation and deletion

use crate::{
    error::{AppError, AppResult},
    marc::{encode, extract_basic_info, EncodeOutcome},
    models::{
        definition::DefinitionSet,
        record::{CreateRecord, Record, RecordFields, RecordShort},
    },
    repository::{
        records::{NewControlField, NewDataField, RecordWriter},
        Repository,
    },
    services::{
        deleter::{delete_record_graph, DeletionReport},
        reconcile::{new_subfields, reconcile_in, ReconcileReport},
        seeder::seed_drafts,
    },
};

#[derive(Clone)]
pub struct RecordsService {
    repository: Repository,
}

impl RecordsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn definitions(&self) -> AppResult<DefinitionSet> {
        Ok(self.repository.definitions.list_all().await?.into())
    }

    /// Get a record with its fields, each carrying its definition
    pub async fn get(&self, id: i32) -> AppResult<Record> {
        let mut record = self.repository.records.get_by_id(id).await?;
        record.attach_definitions(&self.definitions().await?);
        Ok(record)
    }

    /// List record summaries read from their metadata
    pub async fn list(&self) -> AppResult<Vec<RecordShort>> {
        let records = self.repository.records.list().await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let info = extract_basic_info(&record.metadata);
                RecordShort {
                    id: record.id,
                    title: info.title,
                    author: info.author,
                    year: info.year,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                }
            })
            .collect())
    }

    /// Create a record from structured fields.
    /// With a template and no fields, the fields are seeded from the template.
    pub async fn create(&self, input: CreateRecord) -> AppResult<Record> {
        let mut fields = input.fields;
        if fields.is_empty() {
            if let Some(template_id) = input.template_id {
                let template = self.repository.templates.get_by_id(template_id).await?;
                if template.is_none() {
                    tracing::warn!("Template {} not found, creating an empty record", template_id);
                }
                fields = seed_drafts(template.as_ref());
            }
        }

        let (id, outcome) = self
            .create_fields(&fields)
            .await
            .map_err(AppError::record_creation)?;

        tracing::info!(
            "Created record {} ({} control, {} data fields, {} skipped)",
            id,
            fields.control_fields.len(),
            fields.data_fields.len(),
            outcome.skipped.len()
        );
        self.get(id).await
    }

    async fn create_fields(&self, fields: &RecordFields) -> AppResult<(i32, EncodeOutcome)> {
        let definitions = self.definitions().await?;
        let mut tx = self.repository.records.begin().await?;
        let created = create_in(&mut tx, fields, &definitions).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Replace the field set of a record, writing only what changed
    pub async fn reconcile(&self, id: i32, desired: RecordFields) -> AppResult<Record> {
        let report = self
            .reconcile_fields(id, &desired)
            .await
            .map_err(|e| AppError::record("update", id, e))?;

        tracing::info!(
            "Updated record {}: {} field operation(s){}",
            id,
            report.plan.len(),
            if report.metadata_rewritten { ", metadata re-encoded" } else { "" }
        );
        self.get(id).await
    }

    async fn reconcile_fields(&self, id: i32, desired: &RecordFields) -> AppResult<ReconcileReport> {
        let definitions = self.definitions().await?;
        let mut tx = self.repository.records.begin().await?;
        let report = reconcile_in(&mut tx, id, desired, &definitions).await?;
        tx.commit().await?;
        Ok(report)
    }

    /// Delete a record and all its dependents
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let report = self
            .delete_graph(id)
            .await
            .map_err(|e| AppError::record("delete", id, e))?;

        tracing::info!(
            "Deleted record {} ({} data fields, {} control fields, {} holdings)",
            id,
            report.data_fields,
            report.control_fields,
            report.holdings
        );
        Ok(())
    }

    async fn delete_graph(&self, id: i32) -> AppResult<DeletionReport> {
        let mut tx = self.repository.records.begin().await?;
        let report = delete_record_graph(&mut tx, id).await?;
        tx.commit().await?;
        Ok(report)
    }

    /// Encode structured fields without persisting anything
    pub async fn encode_preview(&self, fields: &RecordFields) -> AppResult<EncodeOutcome> {
        Ok(encode(fields, &self.definitions().await?))
    }
}

/// Insert a record and its whole field graph inside the writer's transaction.
/// Positions follow the submitted order.
pub async fn create_in<W: RecordWriter + ?Sized>(
    tx: &mut W,
    fields: &RecordFields,
    definitions: &DefinitionSet,
) -> AppResult<(i32, EncodeOutcome)> {
    let outcome = encode(fields, definitions);
    let record_id = tx.insert_record(&outcome.document).await?;

    for (index, field) in fields.control_fields.iter().enumerate() {
        tx.insert_control_field(
            record_id,
            &NewControlField {
                definition_id: field.definition_id,
                value: field.value.clone(),
                position: index as i32,
            },
        )
        .await?;
    }

    for (index, field) in fields.data_fields.iter().enumerate() {
        tx.insert_data_field(
            record_id,
            &NewDataField {
                definition_id: field.definition_id,
                ind1: field.ind1.clone(),
                ind2: field.ind2.clone(),
                position: index as i32,
                subfields: new_subfields(&field.subfields),
            },
        )
        .await?;
    }

    Ok((record_id, outcome))
}
