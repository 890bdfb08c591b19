//! Records repository.
//!
//! Reads go through the pool. Every write goes through [`RecordWriter`], the
//! set of transaction-scoped primitives used by record creation,
//! reconciliation and deletion; [`RecordTx`] implements it on top of an open
//! Postgres transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgConnection, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    marc::UnimarcDocument,
    models::record::{ControlField, DataField, Record, Subfield},
};

/// New control field under a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewControlField {
    pub definition_id: i32,
    pub value: String,
    pub position: i32,
}

/// In-place update of a persisted control field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFieldUpdate {
    pub id: i32,
    pub definition_id: i32,
    pub value: String,
    pub position: i32,
}

/// New data field, inserted together with its subfields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDataField {
    pub definition_id: i32,
    pub ind1: String,
    pub ind2: String,
    pub position: i32,
    pub subfields: Vec<NewSubfield>,
}

/// In-place update of a persisted data field (subfields excluded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFieldUpdate {
    pub id: i32,
    pub definition_id: i32,
    pub ind1: String,
    pub ind2: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubfield {
    pub value: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubfieldUpdate {
    pub id: i32,
    pub value: String,
    pub position: i32,
}

/// Field graph of one record, in position order
pub type FieldGraph = (Vec<ControlField>, Vec<DataField>);

/// Transaction-scoped write primitives on the record graph.
///
/// All calls made on one writer belong to the same transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordWriter {
    /// Lock the record row until the end of the transaction and return its
    /// current metadata, or `None` if the record does not exist.
    async fn lock_record(&mut self, record_id: i32) -> AppResult<Option<UnimarcDocument>>;

    async fn load_fields(&mut self, record_id: i32) -> AppResult<FieldGraph>;

    async fn insert_record(&mut self, metadata: &UnimarcDocument) -> AppResult<i32>;

    async fn update_metadata(&mut self, record_id: i32, metadata: &UnimarcDocument) -> AppResult<()>;

    async fn insert_control_field(&mut self, record_id: i32, field: &NewControlField) -> AppResult<i32>;

    async fn update_control_field(&mut self, record_id: i32, field: &ControlFieldUpdate) -> AppResult<()>;

    async fn delete_control_fields(&mut self, record_id: i32, ids: &[i32]) -> AppResult<u64>;

    async fn insert_data_field(&mut self, record_id: i32, field: &NewDataField) -> AppResult<i32>;

    async fn update_data_field(&mut self, record_id: i32, field: &DataFieldUpdate) -> AppResult<()>;

    async fn delete_data_fields(&mut self, record_id: i32, ids: &[i32]) -> AppResult<u64>;

    async fn insert_subfield(&mut self, data_field_id: i32, subfield: &NewSubfield) -> AppResult<i32>;

    async fn update_subfield(&mut self, data_field_id: i32, subfield: &SubfieldUpdate) -> AppResult<()>;

    async fn delete_subfields(&mut self, data_field_id: i32, ids: &[i32]) -> AppResult<u64>;

    /// Delete every subfield of the given data fields
    async fn delete_subfields_of(&mut self, data_field_ids: &[i32]) -> AppResult<u64>;

    async fn delete_record_subfields(&mut self, record_id: i32) -> AppResult<u64>;

    async fn delete_record_data_fields(&mut self, record_id: i32) -> AppResult<u64>;

    async fn delete_record_control_fields(&mut self, record_id: i32) -> AppResult<u64>;

    async fn delete_record_holdings(&mut self, record_id: i32) -> AppResult<u64>;

    async fn delete_record(&mut self, record_id: i32) -> AppResult<u64>;
}

#[derive(FromRow)]
struct RecordRow {
    id: i32,
    metadata: Json<UnimarcDocument>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            id: row.id,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            control_fields: Vec::new(),
            data_fields: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct RecordsRepository {
    pool: Pool<Postgres>,
}

impl RecordsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a write transaction
    pub async fn begin(&self) -> AppResult<RecordTx> {
        Ok(RecordTx {
            tx: self.pool.begin().await?,
        })
    }

    /// Get a record with its control fields, data fields and subfields
    pub async fn get_by_id(&self, id: i32) -> AppResult<Record> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT id, metadata, created_at, updated_at FROM records WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))?;

        let mut conn = self.pool.acquire().await?;
        let (control_fields, data_fields) = fetch_fields(&mut conn, id).await?;

        let mut record = Record::from(row);
        record.control_fields = control_fields;
        record.data_fields = data_fields;
        Ok(record)
    }

    /// List all records without their field graph, most recently updated first
    pub async fn list(&self) -> AppResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT id, metadata, created_at, updated_at FROM records ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Record::from).collect())
    }
}

/// Load the field graph of a record, ordered by position
async fn fetch_fields(conn: &mut PgConnection, record_id: i32) -> AppResult<FieldGraph> {
    let control_fields = sqlx::query_as::<_, ControlField>(
        r#"
        SELECT id, record_id, definition_id, value, position
        FROM control_fields
        WHERE record_id = $1
        ORDER BY position, id
        "#,
    )
    .bind(record_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut data_fields = sqlx::query_as::<_, DataField>(
        r#"
        SELECT id, record_id, definition_id, ind1, ind2, position
        FROM data_fields
        WHERE record_id = $1
        ORDER BY position, id
        "#,
    )
    .bind(record_id)
    .fetch_all(&mut *conn)
    .await?;

    let subfields = sqlx::query_as::<_, Subfield>(
        r#"
        SELECT s.id, s.data_field_id, s.value, s.position
        FROM subfields s
        JOIN data_fields d ON d.id = s.data_field_id
        WHERE d.record_id = $1
        ORDER BY s.data_field_id, s.position, s.id
        "#,
    )
    .bind(record_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_field: HashMap<i32, Vec<Subfield>> = HashMap::new();
    for subfield in subfields {
        by_field.entry(subfield.data_field_id).or_default().push(subfield);
    }
    for field in &mut data_fields {
        field.subfields = by_field.remove(&field.id).unwrap_or_default();
    }

    Ok((control_fields, data_fields))
}

/// Open write transaction on the record graph.
/// Dropped without [`RecordTx::commit`], it rolls back.
pub struct RecordTx {
    tx: Transaction<'static, Postgres>,
}

impl RecordTx {
    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl RecordWriter for RecordTx {
    async fn lock_record(&mut self, record_id: i32) -> AppResult<Option<UnimarcDocument>> {
        let metadata = sqlx::query_scalar::<_, Json<UnimarcDocument>>(
            "SELECT metadata FROM records WHERE id = $1 FOR UPDATE",
        )
        .bind(record_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(metadata.map(|m| m.0))
    }

    async fn load_fields(&mut self, record_id: i32) -> AppResult<FieldGraph> {
        fetch_fields(&mut self.tx, record_id).await
    }

    async fn insert_record(&mut self, metadata: &UnimarcDocument) -> AppResult<i32> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO records (metadata, created_at, updated_at) VALUES ($1, $2, $2) RETURNING id",
        )
        .bind(Json(metadata))
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_metadata(&mut self, record_id: i32, metadata: &UnimarcDocument) -> AppResult<()> {
        sqlx::query("UPDATE records SET metadata = $1, updated_at = $2 WHERE id = $3")
            .bind(Json(metadata))
            .bind(Utc::now())
            .bind(record_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_control_field(&mut self, record_id: i32, field: &NewControlField) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO control_fields (record_id, definition_id, value, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(record_id)
        .bind(field.definition_id)
        .bind(&field.value)
        .bind(field.position)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_control_field(&mut self, record_id: i32, field: &ControlFieldUpdate) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE control_fields
            SET definition_id = $1, value = $2, position = $3
            WHERE id = $4 AND record_id = $5
            "#,
        )
        .bind(field.definition_id)
        .bind(&field.value)
        .bind(field.position)
        .bind(field.id)
        .bind(record_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Control field {} not found in record {}",
                field.id, record_id
            )));
        }
        Ok(())
    }

    async fn delete_control_fields(&mut self, record_id: i32, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM control_fields WHERE record_id = $1 AND id = ANY($2)")
            .bind(record_id)
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_data_field(&mut self, record_id: i32, field: &NewDataField) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO data_fields (record_id, definition_id, ind1, ind2, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(record_id)
        .bind(field.definition_id)
        .bind(&field.ind1)
        .bind(&field.ind2)
        .bind(field.position)
        .fetch_one(&mut *self.tx)
        .await?;

        for subfield in &field.subfields {
            self.insert_subfield(id, subfield).await?;
        }
        Ok(id)
    }

    async fn update_data_field(&mut self, record_id: i32, field: &DataFieldUpdate) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE data_fields
            SET definition_id = $1, ind1 = $2, ind2 = $3, position = $4
            WHERE id = $5 AND record_id = $6
            "#,
        )
        .bind(field.definition_id)
        .bind(&field.ind1)
        .bind(&field.ind2)
        .bind(field.position)
        .bind(field.id)
        .bind(record_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Data field {} not found in record {}",
                field.id, record_id
            )));
        }
        Ok(())
    }

    async fn delete_data_fields(&mut self, record_id: i32, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM data_fields WHERE record_id = $1 AND id = ANY($2)")
            .bind(record_id)
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_subfield(&mut self, data_field_id: i32, subfield: &NewSubfield) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO subfields (data_field_id, value, position) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(data_field_id)
        .bind(&subfield.value)
        .bind(subfield.position)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_subfield(&mut self, data_field_id: i32, subfield: &SubfieldUpdate) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE subfields SET value = $1, position = $2 WHERE id = $3 AND data_field_id = $4",
        )
        .bind(&subfield.value)
        .bind(subfield.position)
        .bind(subfield.id)
        .bind(data_field_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Subfield {} not found in data field {}",
                subfield.id, data_field_id
            )));
        }
        Ok(())
    }

    async fn delete_subfields(&mut self, data_field_id: i32, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM subfields WHERE data_field_id = $1 AND id = ANY($2)")
            .bind(data_field_id)
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_subfields_of(&mut self, data_field_ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM subfields WHERE data_field_id = ANY($1)")
            .bind(data_field_ids)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_record_subfields(&mut self, record_id: i32) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM subfields
            WHERE data_field_id IN (SELECT id FROM data_fields WHERE record_id = $1)
            "#,
        )
        .bind(record_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_record_data_fields(&mut self, record_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM data_fields WHERE record_id = $1")
            .bind(record_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_record_control_fields(&mut self, record_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM control_fields WHERE record_id = $1")
            .bind(record_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_record_holdings(&mut self, record_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM holdings WHERE record_id = $1")
            .bind(record_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_record(&mut self, record_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(record_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}
