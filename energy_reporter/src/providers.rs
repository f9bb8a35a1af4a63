//! Provider abstraction for metering data sources.
//!
//! This module defines the [`DeviceReader`] trait, the interface the collection
//! step uses to fetch one device's consumption for a [`TimeWindow`].
//!
//! Each concrete metering backend (currently Shelly Cloud) implements
//! [`DeviceReader`] and keeps its vendor-specific request building and
//! response parsing to itself. The trait is object safe so the pipeline can
//! hold an `Arc<dyn DeviceReader>` and tests can substitute fakes.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use energy_reporter::models::{
//!     consumption::ConsumptionRecord, endpoint::DeviceEndpointConfig, time_window::TimeWindow,
//! };
//! use energy_reporter::providers::{DeviceReader, ReadError};
//!
//! struct Idle;
//!
//! #[async_trait]
//! impl DeviceReader for Idle {
//!     async fn read_consumption(
//!         &self,
//!         endpoint: &DeviceEndpointConfig,
//!         _window: &TimeWindow,
//!     ) -> Result<ConsumptionRecord, ReadError> {
//!         Ok(ConsumptionRecord {
//!             device_id: endpoint.device_id.clone(),
//!             destination_field_id: endpoint.destination_field_id.clone(),
//!             total_consumption: 0.0,
//!             unit: "Wh".into(),
//!             history: vec![],
//!         })
//!     }
//! }
//! ```

pub mod shelly_cloud;

use std::time::Duration;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{
    consumption::ConsumptionRecord, endpoint::DeviceEndpointConfig, time_window::TimeWindow,
};

/// Reads the consumption of a single metering device.
#[async_trait]
pub trait DeviceReader: Send + Sync {
    /// Fetches the consumption of `endpoint.device_id` over `window`.
    ///
    /// The returned record must already carry the endpoint's device and
    /// destination field identifiers.
    async fn read_consumption(
        &self,
        endpoint: &DeviceEndpointConfig,
        window: &TimeWindow,
    ) -> Result<ConsumptionRecord, ReadError>;
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// The configured endpoint does not parse as a URL.
    #[snafu(display("Invalid metering endpoint '{url}': {source}"))]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
        backtrace: Backtrace,
    },

    /// The configured endpoint is not an http(s) URL.
    #[snafu(display("Metering endpoint '{url}' must use http or https"))]
    UnsupportedScheme { url: String, backtrace: Backtrace },
}

/// A failed device read. Every variant names the device it belongs to.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReadError {
    /// Network failure, refused connection, TLS error, ...
    #[snafu(display("device {device_id}: request failed: {source}"))]
    Request {
        device_id: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a non-success HTTP status.
    #[snafu(display("device {device_id}: HTTP {status}: {body}"))]
    Status {
        device_id: String,
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The body was not the expected JSON document.
    #[snafu(display("device {device_id}: unparsable response: {source}"))]
    Decode {
        device_id: String,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The API reported an error in its envelope (e.g. bad auth key).
    #[snafu(display("device {device_id}: API error: {message}"))]
    Api {
        device_id: String,
        message: String,
        backtrace: Backtrace,
    },

    /// No answer within the per-request timeout.
    #[snafu(display("device {device_id}: no response within {}s", timeout.as_secs_f64()))]
    Timeout {
        device_id: String,
        timeout: Duration,
        backtrace: Backtrace,
    },
}

impl ReadError {
    /// The device this error belongs to.
    pub fn device_id(&self) -> &str {
        match self {
            ReadError::Request { device_id, .. }
            | ReadError::Status { device_id, .. }
            | ReadError::Decode { device_id, .. }
            | ReadError::Api { device_id, .. }
            | ReadError::Timeout { device_id, .. } => device_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;

    struct FixedReader(f64);
    struct BrokenReader;

    #[async_trait]
    impl DeviceReader for FixedReader {
        async fn read_consumption(
            &self,
            endpoint: &DeviceEndpointConfig,
            _window: &TimeWindow,
        ) -> Result<ConsumptionRecord, ReadError> {
            Ok(ConsumptionRecord {
                device_id: endpoint.device_id.clone(),
                destination_field_id: endpoint.destination_field_id.clone(),
                total_consumption: self.0,
                unit: "Wh".into(),
                history: vec![],
            })
        }
    }

    #[async_trait]
    impl DeviceReader for BrokenReader {
        async fn read_consumption(
            &self,
            endpoint: &DeviceEndpointConfig,
            _window: &TimeWindow,
        ) -> Result<ConsumptionRecord, ReadError> {
            ApiSnafu {
                device_id: endpoint.device_id.clone(),
                message: "wrong auth_key",
            }
            .fail()
        }
    }

    // Chosen at runtime, used through the trait object only.
    fn get_reader(name: &str) -> Arc<dyn DeviceReader> {
        if name == "fixed" {
            Arc::new(FixedReader(42.0))
        } else {
            Arc::new(BrokenReader)
        }
    }

    fn endpoint() -> DeviceEndpointConfig {
        DeviceEndpointConfig {
            device_id: "abc123".into(),
            destination_field_id: "entry.1".into(),
        }
    }

    #[tokio::test]
    async fn test_dynamic_reader() {
        let window = TimeWindow::day_of(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        let rec = get_reader("fixed")
            .read_consumption(&endpoint(), &window)
            .await
            .unwrap();
        assert_eq!(rec.total_consumption, 42.0);
        assert_eq!(rec.destination_field_id, "entry.1");
    }

    #[tokio::test]
    async fn errors_are_tagged_with_device() {
        let window = TimeWindow::day_of(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        let err = get_reader("broken")
            .read_consumption(&endpoint(), &window)
            .await
            .unwrap_err();
        assert_eq!(err.device_id(), "abc123");
        assert!(err.to_string().contains("wrong auth_key"));
    }
}
