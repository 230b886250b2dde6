//! Ports - interfaces for everything outside the player.

pub mod outbound;
