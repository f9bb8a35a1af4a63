//! Concurrent collection of device readings.
//!
//! All reads of a run are polled together on the calling task; results are
//! joined back in configuration order, independent of completion order.

use std::time::Duration;

use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    errors::Error,
    models::{
        consumption::ConsumptionRecord, endpoint::DeviceEndpointConfig, time_window::TimeWindow,
    },
    providers::{DeviceReader, ReadError, TimeoutSnafu},
};

/// What to do when some device reads fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed read fails the whole collection.
    #[default]
    FailFast,
    /// Failed reads are logged and skipped. Fails only if nothing was read.
    BestEffort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(FailurePolicy::FailFast),
            "best_effort" => Ok(FailurePolicy::BestEffort),
            other => Err(format!("unknown failure policy '{other}'")),
        }
    }
}

/// Collection settings that stay fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Upper bound for a single device read.
    pub request_timeout: Duration,
    pub policy: FailurePolicy,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            policy: FailurePolicy::FailFast,
        }
    }
}

/// Reads every endpoint concurrently and returns the records in input order.
///
/// # Errors
/// With [`FailurePolicy::FailFast`] the first failed read is returned and the
/// remaining in-flight reads are dropped. With [`FailurePolicy::BestEffort`]
/// an error is returned only when every read failed.
pub async fn collect_readings(
    reader: &dyn DeviceReader,
    endpoints: &[DeviceEndpointConfig],
    window: &TimeWindow,
    options: CollectOptions,
) -> Result<Vec<ConsumptionRecord>, Error> {
    let reads = endpoints
        .iter()
        .map(|endpoint| read_with_timeout(reader, endpoint, window, options.request_timeout));

    let records = match options.policy {
        FailurePolicy::FailFast => try_join_all(reads).await?,
        FailurePolicy::BestEffort => {
            let mut records = Vec::with_capacity(endpoints.len());
            let mut last_err = None;
            for result in join_all(reads).await {
                match result {
                    Ok(record) => records.push(record),
                    Err(err) => {
                        warn!(device_id = err.device_id(), error = %err, "skipping device");
                        last_err = Some(err);
                    }
                }
            }
            match (records.is_empty(), last_err) {
                (true, Some(err)) => return Err(err.into()),
                _ => records,
            }
        }
    };

    info!(devices = records.len(), %window, "collected readings");
    Ok(records)
}

async fn read_with_timeout(
    reader: &dyn DeviceReader,
    endpoint: &DeviceEndpointConfig,
    window: &TimeWindow,
    timeout: Duration,
) -> Result<ConsumptionRecord, ReadError> {
    match tokio::time::timeout(timeout, reader.read_consumption(endpoint, window)).await {
        Ok(result) => result,
        Err(_) => TimeoutSnafu {
            device_id: endpoint.device_id.as_str(),
            timeout,
        }
        .fail(),
    }
}
