//! Record templates: reusable presets of field definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Template with its ordered definition references
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Template {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub control_fields: Vec<TemplateControlField>,
    #[sqlx(skip)]
    #[serde(default)]
    pub data_fields: Vec<TemplateDataField>,
}

/// Control-field definition reference of a template
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TemplateControlField {
    pub definition_id: i32,
}

/// Data-field definition reference of a template, with default indicators
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TemplateDataField {
    pub definition_id: i32,
    pub default_ind1: Option<String>,
    pub default_ind2: Option<String>,
}

/// Template summary for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TemplateShort {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}
