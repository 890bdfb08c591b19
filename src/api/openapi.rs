//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{definitions, health, records, templates};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Elidune Records API",
        version = "1.1.0",
        description = "UNIMARC bibliographic record engine REST API",
        license(name = "GPL-2.0", url = "https://www.gnu.org/licenses/gpl-2.0.html"),
        contact(name = "Elidune Team", email = "contact@elidune.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Definitions
        definitions::list_definitions,
        definitions::get_control_definition,
        definitions::get_data_definition,
        definitions::get_definition_by_tag,
        // Templates
        templates::list_templates,
        templates::get_template,
        templates::seed_template,
        // Records
        records::list_records,
        records::get_record,
        records::create_record,
        records::update_record,
        records::delete_record,
        records::encode_record,
    ),
    components(
        schemas(
            // Definitions
            crate::models::definition::ControlFieldDefinition,
            crate::models::definition::DataFieldDefinition,
            crate::models::definition::TaggedDefinition,
            crate::models::definition::DefinitionCatalog,
            // Templates
            crate::models::template::Template,
            crate::models::template::TemplateShort,
            crate::models::template::TemplateControlField,
            crate::models::template::TemplateDataField,
            // Records
            crate::models::record::Record,
            crate::models::record::RecordShort,
            crate::models::record::ControlField,
            crate::models::record::DataField,
            crate::models::record::Subfield,
            crate::models::record::CreateRecord,
            crate::models::record::RecordFields,
            crate::models::record::ControlFieldInput,
            crate::models::record::DataFieldInput,
            crate::models::record::SubfieldInput,
            // Encoding
            crate::marc::encoder::UnimarcDocument,
            crate::marc::encoder::FieldValue,
            crate::marc::encoder::DataFieldValue,
            crate::marc::encoder::FieldKind,
            crate::marc::encoder::SkippedField,
            crate::marc::encoder::EncodeOutcome,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "definitions", description = "Field definition catalog"),
        (name = "templates", description = "Record templates"),
        (name = "records", description = "Bibliographic record management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
