//! Bibliographic record endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    marc::EncodeOutcome,
    models::record::{CreateRecord, Record, RecordFields, RecordShort},
    AppState,
};

/// List records with their title, author and year
#[utoipa::path(
    get,
    path = "/records",
    tag = "records",
    responses(
        (status = 200, description = "List of records", body = Vec<RecordShort>)
    )
)]
pub async fn list_records(State(state): State<AppState>) -> AppResult<Json<Vec<RecordShort>>> {
    let records = state.services.records.list().await?;
    Ok(Json(records))
}

/// Get a record with its fields and subfields
#[utoipa::path(
    get,
    path = "/records/{id}",
    tag = "records",
    params(
        ("id" = i32, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record details", body = Record),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Record>> {
    let record = state.services.records.get(id).await?;
    Ok(Json(record))
}

/// Create a record
#[utoipa::path(
    post,
    path = "/records",
    tag = "records",
    request_body = CreateRecord,
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    Json(input): Json<CreateRecord>,
) -> AppResult<(StatusCode, Json<Record>)> {
    let created = state.services.records.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace the field set of a record.
/// Fields and subfields carrying an id are updated, those without one are
/// created and persisted ones left out are deleted.
#[utoipa::path(
    put,
    path = "/records/{id}",
    tag = "records",
    params(
        ("id" = i32, Path, description = "Record ID")
    ),
    request_body = RecordFields,
    responses(
        (status = 200, description = "Record updated", body = Record),
        (status = 404, description = "Record, field or subfield not found")
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(fields): Json<RecordFields>,
) -> AppResult<Json<Record>> {
    let updated = state.services.records.reconcile(id, fields).await?;
    Ok(Json(updated))
}

/// Delete a record with its fields and holdings
#[utoipa::path(
    delete,
    path = "/records/{id}",
    tag = "records",
    params(
        ("id" = i32, Path, description = "Record ID")
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found")
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.records.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Encode a field set without saving it
#[utoipa::path(
    post,
    path = "/records/encode",
    tag = "records",
    request_body = RecordFields,
    responses(
        (status = 200, description = "Encoded document with skipped fields and tag collisions", body = EncodeOutcome)
    )
)]
pub async fn encode_record(
    State(state): State<AppState>,
    Json(fields): Json<RecordFields>,
) -> AppResult<Json<EncodeOutcome>> {
    let outcome = state.services.records.encode_preview(&fields).await?;
    Ok(Json(outcome))
}
