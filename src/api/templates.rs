//! Template endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        record::RecordFields,
        template::{Template, TemplateShort},
    },
    AppState,
};

/// List templates
#[utoipa::path(
    get,
    path = "/templates",
    tag = "templates",
    responses(
        (status = 200, description = "List of templates", body = Vec<TemplateShort>)
    )
)]
pub async fn list_templates(State(state): State<AppState>) -> AppResult<Json<Vec<TemplateShort>>> {
    let templates = state.services.catalog.list_templates().await?;
    Ok(Json(templates))
}

/// Get a template with its field entries
#[utoipa::path(
    get,
    path = "/templates/{id}",
    tag = "templates",
    params(
        ("id" = i32, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template details", body = Template),
        (status = 404, description = "Template not found")
    )
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Template>> {
    let template = state.services.catalog.get_template(id).await?;
    Ok(Json(template))
}

/// Blank field drafts for a new record.
/// An unknown template yields empty drafts.
#[utoipa::path(
    get,
    path = "/templates/{id}/seed",
    tag = "templates",
    params(
        ("id" = i32, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Field drafts", body = RecordFields)
    )
)]
pub async fn seed_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<RecordFields>> {
    let drafts = state.services.catalog.seed(id).await?;
    Ok(Json(drafts))
}
