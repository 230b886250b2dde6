//! Application layer - services that drive the chat.

pub mod services;
