//! Shelly Cloud consumption statistics.
//!
//! One `POST` per device to the cloud's statistics endpoint
//! (e.g. `https://shelly-XX-eu.shelly.cloud/statistics/relay/consumption`).

pub mod params;
pub mod provider;
pub mod response;

pub use provider::ShellyCloudProvider;
