//! Definition and template catalog service

use crate::{
    error::{AppError, AppResult},
    models::{
        definition::{ControlFieldDefinition, DataFieldDefinition, DefinitionCatalog, TaggedDefinition},
        record::RecordFields,
        template::{Template, TemplateShort},
    },
    repository::Repository,
    services::seeder::seed_drafts,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every control and data field definition
    pub async fn list_definitions(&self) -> AppResult<DefinitionCatalog> {
        self.repository.definitions.list_all().await
    }

    pub async fn get_control_definition(&self, id: i32) -> AppResult<ControlFieldDefinition> {
        self.repository.definitions.get_control_by_id(id).await
    }

    pub async fn get_data_definition(&self, id: i32) -> AppResult<DataFieldDefinition> {
        self.repository.definitions.get_data_by_id(id).await
    }

    pub async fn get_definition_by_tag(&self, tag: &str) -> AppResult<TaggedDefinition> {
        if tag.len() != 3 {
            return Err(AppError::Validation(format!(
                "Tag must be 3 characters, got '{}'",
                tag
            )));
        }
        self.repository.definitions.get_by_tag(tag).await
    }

    pub async fn list_templates(&self) -> AppResult<Vec<TemplateShort>> {
        self.repository.templates.list().await
    }

    pub async fn get_template(&self, id: i32) -> AppResult<Template> {
        self.repository
            .templates
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))
    }

    /// Blank field drafts for a new record based on a template.
    /// An unknown template yields empty drafts.
    pub async fn seed(&self, template_id: i32) -> AppResult<RecordFields> {
        let template = self.repository.templates.get_by_id(template_id).await?;
        if template.is_none() {
            tracing::debug!("Template {} not found, no drafts seeded", template_id);
        }
        Ok(seed_drafts(template.as_ref()))
    }
}
