//! Signed REST client for the Tuya IoT cloud.

mod client;
mod error;
mod models;
mod sign;
mod token;

pub use client::TuyaClient;
pub use error::ApiError;
pub use models::DeviceInfo;
