//! Positional pairing of metering devices with sink fields.

use crate::errors::Error;

/// One metering device and the sink field its daily total is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpointConfig {
    /// Device identifier as known by the metering API.
    pub device_id: String,
    /// Identifier of the form field receiving this device's value (e.g. `entry.123456`).
    pub destination_field_id: String,
}

/// Pairs `device_ids[i]` with `field_ids[i]`.
///
/// Both lists come from configuration and must have the same, non-zero
/// length. Blank entries are rejected so a stray comma cannot shift every
/// following device onto the wrong field.
///
/// # Errors
/// Returns [`Error::Config`] on empty lists, blank entries or a length mismatch.
pub fn map_endpoints<D, F>(device_ids: &[D], field_ids: &[F]) -> Result<Vec<DeviceEndpointConfig>, Error>
where
    D: AsRef<str>,
    F: AsRef<str>,
{
    if device_ids.is_empty() {
        return Err(Error::Config("no device ids configured".into()));
    }
    if device_ids.len() != field_ids.len() {
        return Err(Error::Config(format!(
            "{} device ids but {} destination field ids",
            device_ids.len(),
            field_ids.len()
        )));
    }

    device_ids
        .iter()
        .zip(field_ids)
        .enumerate()
        .map(|(i, (device, field))| {
            let device_id = device.as_ref().trim();
            let destination_field_id = field.as_ref().trim();
            if device_id.is_empty() || destination_field_id.is_empty() {
                return Err(Error::Config(format!("blank entry at position {i}")));
            }
            Ok(DeviceEndpointConfig {
                device_id: device_id.to_string(),
                destination_field_id: destination_field_id.to_string(),
            })
        })
        .collect()
}
