//! Repository layer for database operations

pub mod definitions;
pub mod records;
pub mod templates;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub definitions: definitions::DefinitionsRepository,
    pub templates: templates::TemplatesRepository,
    pub records: records::RecordsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            definitions: definitions::DefinitionsRepository::new(pool.clone()),
            templates: templates::TemplatesRepository::new(pool.clone()),
            records: records::RecordsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
