//! LevelUp Player crate.
//!
//! Client side of the chat: the progression controller, the services it uses
//! to reach the proxy, and the adapters behind their ports.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;

pub use application::services::{ControllerError, ProgressionController, ProgressionSnapshot};
pub use config::PlayerConfig;
