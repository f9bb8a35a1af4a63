//! Unit normalization to the sink's kilowatt-hours.

use tracing::warn;

use crate::models::consumption::ConsumptionRecord;

/// Unit the sink expects.
pub const SINK_UNIT: &str = "kWh";

/// The record's total in kilowatt-hours.
///
/// `Wh` is divided by 1000 and `kWh` is used as is. Any other unit is
/// forwarded unchanged with a warning, so one odd device does not block the
/// daily report.
pub fn normalize(record: &ConsumptionRecord) -> f64 {
    match record.unit.as_str() {
        "Wh" => record.total_consumption / 1000.0,
        SINK_UNIT => record.total_consumption,
        other => {
            warn!(
                device_id = %record.device_id,
                unit = other,
                "unrecognized consumption unit, forwarding value unconverted"
            );
            record.total_consumption
        }
    }
}

/// `(destination_field_id, kWh)` pairs in record order.
pub fn normalize_all(records: &[ConsumptionRecord]) -> Vec<(String, f64)> {
    records
        .iter()
        .map(|r| (r.destination_field_id.clone(), normalize(r)))
        .collect()
}
