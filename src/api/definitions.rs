//! Field definition endpoints (read-only)

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::definition::{
        ControlFieldDefinition, DataFieldDefinition, DefinitionCatalog, TaggedDefinition,
    },
    AppState,
};

/// List all control and data field definitions
#[utoipa::path(
    get,
    path = "/definitions",
    tag = "definitions",
    responses(
        (status = 200, description = "Definition catalog", body = DefinitionCatalog)
    )
)]
pub async fn list_definitions(State(state): State<AppState>) -> AppResult<Json<DefinitionCatalog>> {
    let catalog = state.services.catalog.list_definitions().await?;
    Ok(Json(catalog))
}

/// Get a control field definition
#[utoipa::path(
    get,
    path = "/definitions/control/{id}",
    tag = "definitions",
    params(
        ("id" = i32, Path, description = "Definition ID")
    ),
    responses(
        (status = 200, description = "Control field definition", body = ControlFieldDefinition),
        (status = 404, description = "Definition not found")
    )
)]
pub async fn get_control_definition(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ControlFieldDefinition>> {
    let definition = state.services.catalog.get_control_definition(id).await?;
    Ok(Json(definition))
}

/// Get a data field definition
#[utoipa::path(
    get,
    path = "/definitions/data/{id}",
    tag = "definitions",
    params(
        ("id" = i32, Path, description = "Definition ID")
    ),
    responses(
        (status = 200, description = "Data field definition", body = DataFieldDefinition),
        (status = 404, description = "Definition not found")
    )
)]
pub async fn get_data_definition(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<DataFieldDefinition>> {
    let definition = state.services.catalog.get_data_definition(id).await?;
    Ok(Json(definition))
}

/// Find a definition of either kind by its tag
#[utoipa::path(
    get,
    path = "/definitions/tag/{tag}",
    tag = "definitions",
    params(
        ("tag" = String, Path, description = "3-character tag, e.g. 200")
    ),
    responses(
        (status = 200, description = "Matching definition", body = TaggedDefinition),
        (status = 400, description = "Malformed tag"),
        (status = 404, description = "No definition with this tag")
    )
)]
pub async fn get_definition_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> AppResult<Json<TaggedDefinition>> {
    let definition = state.services.catalog.get_definition_by_tag(&tag).await?;
    Ok(Json(definition))
}
