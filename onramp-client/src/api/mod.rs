//! API endpoint implementations.

mod email;
mod health;
mod pin;
mod platforms;

pub use email::EmailApi;
pub use health::HealthApi;
pub use pin::PinApi;
pub use platforms::PlatformsApi;
