use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::models::{endpoint::DeviceEndpointConfig, time_window::TimeWindow};

/// Relay channel queried on multi-channel devices.
pub const DEFAULT_CHANNEL: u8 = 0;

/// Range selector telling the API to honour `date_from`/`date_to`.
#[derive(Clone, Copy, Debug, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    Custom,
}

/// Form body of a statistics request. Not `Debug`: it holds the exposed key.
#[derive(Serialize)]
pub struct ConsumptionQuery<'a> {
    pub id: &'a str,
    pub channel: u8,
    pub date_range: DateRange,
    pub date_from: String,
    pub date_to: String,
    pub auth_key: &'a str,
}

/// Builds the form body for one device.
///
/// The returned value borrows the exposed key; keep it on the stack of the
/// request that sends it.
pub fn construct_query<'a>(
    endpoint: &'a DeviceEndpointConfig,
    window: &TimeWindow,
    auth_key: &'a SecretString,
) -> ConsumptionQuery<'a> {
    ConsumptionQuery {
        id: &endpoint.device_id,
        channel: DEFAULT_CHANNEL,
        date_range: DateRange::Custom,
        date_from: window.from_param(),
        date_to: window.to_param(),
        auth_key: auth_key.expose_secret(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn query_carries_window_channel_and_key() {
        let ep = DeviceEndpointConfig {
            device_id: "A".into(),
            destination_field_id: "entry1".into(),
        };
        let window = TimeWindow::day_of(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        let key = SecretString::new("s3cret".into());
        let q = construct_query(&ep, &window, &key);

        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["id"], "A");
        assert_eq!(json["channel"], 0);
        assert_eq!(json["date_range"], "custom");
        assert_eq!(json["date_from"], "2024-03-09 00:00:00");
        assert_eq!(json["date_to"], "2024-03-10 00:00:00");
        assert_eq!(json["auth_key"], "s3cret");
    }
}
