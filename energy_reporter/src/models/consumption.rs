//! Canonical in-memory representation of one device's consumption reading.
//!
//! Records are produced by [`DeviceReader`](crate::providers::DeviceReader)
//! implementations, tagged with the device/field pair they were read for and
//! handed to the normalizer. They are never persisted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::endpoint::DeviceEndpointConfig;

/// A single history bucket reported alongside the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionSample {
    /// Start of the bucket, local wall-clock time.
    #[serde(with = "wire_timestamp")]
    pub datetime: NaiveDateTime,
    /// Energy used in the bucket, in the record's unit.
    #[serde(deserialize_with = "number_or_string")]
    pub consumption: f64,
    /// `false` when the device was offline for the bucket.
    #[serde(default = "available_default")]
    pub available: bool,
}

/// Unit block of the metering response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionUnits {
    pub consumption: String,
}

/// The statistics payload for one device, as returned by the metering API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionData {
    #[serde(deserialize_with = "number_or_string")]
    pub total: f64,
    pub units: ConsumptionUnits,
    #[serde(default)]
    pub history: Vec<ConsumptionSample>,
}

/// A device reading, tagged with the endpoint it was read for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionRecord {
    pub device_id: String,
    pub destination_field_id: String,
    /// Total consumption over the query window, in `unit`.
    pub total_consumption: f64,
    /// Unit as reported by the device (`"Wh"`, `"kWh"`, ...).
    pub unit: String,
    pub history: Vec<ConsumptionSample>,
}

impl ConsumptionRecord {
    pub fn from_data(endpoint: &DeviceEndpointConfig, data: ConsumptionData) -> Self {
        Self {
            device_id: endpoint.device_id.clone(),
            destination_field_id: endpoint.destination_field_id.clone(),
            total_consumption: data.total,
            unit: data.units.consumption,
            history: data.history,
        }
    }
}

fn available_default() -> bool {
    true
}

/// The metering API is loose about numeric types; accept `12.5` and `"12.5"`.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("expected a number, got {s:?}: {e}"))),
    }
}

mod wire_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::time_window::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}
