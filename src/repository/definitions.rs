//! Definition catalog repository (read-only)

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::definition::{
        ControlFieldDefinition, DataFieldDefinition, DefinitionCatalog, TaggedDefinition,
    },
};

#[derive(Clone)]
pub struct DefinitionsRepository {
    pool: Pool<Postgres>,
}

impl DefinitionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetch every definition of both kinds, ordered by tag
    pub async fn list_all(&self) -> AppResult<DefinitionCatalog> {
        let control_fields = sqlx::query_as::<_, ControlFieldDefinition>(
            "SELECT id, tag, name, tips FROM control_field_definitions ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?;

        let data_fields = sqlx::query_as::<_, DataFieldDefinition>(
            "SELECT id, tag, name, ind1_name, ind2_name, tips FROM data_field_definitions ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DefinitionCatalog {
            control_fields,
            data_fields,
        })
    }

    /// Get a control-field definition by ID
    pub async fn get_control_by_id(&self, id: i32) -> AppResult<ControlFieldDefinition> {
        sqlx::query_as::<_, ControlFieldDefinition>(
            "SELECT id, tag, name, tips FROM control_field_definitions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Control field definition {} not found", id)))
    }

    /// Get a data-field definition by ID
    pub async fn get_data_by_id(&self, id: i32) -> AppResult<DataFieldDefinition> {
        sqlx::query_as::<_, DataFieldDefinition>(
            "SELECT id, tag, name, ind1_name, ind2_name, tips FROM data_field_definitions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Data field definition {} not found", id)))
    }

    /// Find a definition by tag. Control definitions are looked up first.
    pub async fn get_by_tag(&self, tag: &str) -> AppResult<TaggedDefinition> {
        let control = sqlx::query_as::<_, ControlFieldDefinition>(
            "SELECT id, tag, name, tips FROM control_field_definitions WHERE tag = $1",
        )
        .bind(tag)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(definition) = control {
            return Ok(TaggedDefinition::Control(definition));
        }

        sqlx::query_as::<_, DataFieldDefinition>(
            "SELECT id, tag, name, ind1_name, ind2_name, tips FROM data_field_definitions WHERE tag = $1",
        )
        .bind(tag)
        .fetch_optional(&self.pool)
        .await?
        .map(TaggedDefinition::Data)
        .ok_or_else(|| AppError::NotFound(format!("No definition with tag {}", tag)))
    }
}
