//! API handlers for the record engine REST endpoints

pub mod definitions;
pub mod health;
pub mod openapi;
pub mod records;
pub mod templates;
