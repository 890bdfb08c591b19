//! Elidune bibliographic record engine
//!
//! Stores UNIMARC records as structured control fields, data fields and
//! subfields, keeps an encoded copy of each record in sync with them, and
//! serves the whole through a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod marc;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub repository: repository::Repository,
}
