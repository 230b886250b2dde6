//! LevelUp Engine library.
//!
//! This crate contains the proxy service that sits between chat clients and
//! the external game API.
//!
//! ## Structure
//!
//! - `config` - Process configuration, read once at startup
//! - `use_cases/` - Catalog listing and turn forwarding
//! - `infrastructure/` - Game API port and its reqwest adapter
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
pub use config::ProxyConfig;
