//! Application services
//!
//! Services depend on port traits, not concrete infrastructure
//! implementations.

pub mod catalog_service;
pub mod chat_service;
pub mod progression_controller;

pub use catalog_service::CatalogService;
pub use chat_service::ChatService;
pub use progression_controller::{ControllerError, ProgressionController, ProgressionSnapshot};
