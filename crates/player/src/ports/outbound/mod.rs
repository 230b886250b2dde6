//! Outbound ports - Interfaces for external services
//!
//! Application services talk to the proxy, the clock and the user's
//! notification surface only through these traits.

pub mod api_port;
pub mod clock_port;
pub mod notification_port;
pub mod raw_api_port;

pub use api_port::ApiError;
pub use clock_port::ClockPort;
pub use notification_port::{Notification, NotificationKind, NotificationPort};
pub use raw_api_port::RawApiPort;

#[cfg(test)]
pub use clock_port::MockClockPort;
#[cfg(test)]
pub use raw_api_port::MockRawApiPort;
