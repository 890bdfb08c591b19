//! Template catalog repository (read-only)

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::template::{Template, TemplateControlField, TemplateDataField, TemplateShort},
};

#[derive(Clone)]
pub struct TemplatesRepository {
    pool: Pool<Postgres>,
}

impl TemplatesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all templates
    pub async fn list(&self) -> AppResult<Vec<TemplateShort>> {
        let rows = sqlx::query_as::<_, TemplateShort>(
            "SELECT id, name, description FROM templates ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a template with its ordered definition references.
    /// Returns `None` when the template does not exist.
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Template>> {
        let template = sqlx::query_as::<_, Template>(
            "SELECT id, name, description, created_at, updated_at FROM templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut template) = template else {
            return Ok(None);
        };

        template.control_fields = sqlx::query_as::<_, TemplateControlField>(
            r#"
            SELECT definition_id
            FROM template_control_fields
            WHERE template_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        template.data_fields = sqlx::query_as::<_, TemplateDataField>(
            r#"
            SELECT definition_id, default_ind1, default_ind2
            FROM template_data_fields
            WHERE template_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(template))
    }
}
