//! Business logic services

pub mod catalog;
pub mod deleter;
pub mod reconcile;
pub mod records;
pub mod seeder;

#[cfg(test)]
mod testing;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub records: records::RecordsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            records: records::RecordsService::new(repository),
        }
    }
}
