use serde::Deserialize;
use serde_json::Value;

use crate::models::consumption::ConsumptionData;

/// Shelly's `{"isok": .., "data": .., "errors": ..}` wrapper.
#[derive(Deserialize, Debug)]
pub struct Envelope {
    pub isok: bool,
    #[serde(default)]
    pub data: Option<ConsumptionData>,
    #[serde(default)]
    pub errors: Option<Value>,
}

/// Body of a statistics response.
///
/// The cloud wraps the payload in an [`Envelope`]; some proxies and older
/// firmware return the payload bare.
#[derive(Debug)]
pub enum ShellyResponse {
    Envelope(Envelope),
    Bare(ConsumptionData),
}

impl ShellyResponse {
    /// Parses a response body.
    ///
    /// The shape is picked from the presence of `isok`, so a malformed field
    /// is reported as such instead of as a shape mismatch.
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;
        if value.get("isok").is_some() {
            serde_json::from_str(body).map(ShellyResponse::Envelope)
        } else {
            serde_json::from_str(body).map(ShellyResponse::Bare)
        }
    }

    /// Unwraps the payload, or the API's own error description.
    pub fn into_data(self) -> Result<ConsumptionData, String> {
        match self {
            ShellyResponse::Bare(data) => Ok(data),
            ShellyResponse::Envelope(Envelope {
                isok: true,
                data: Some(data),
                ..
            }) => Ok(data),
            ShellyResponse::Envelope(Envelope { isok: true, data: None, .. }) => {
                Err("response has no data".to_string())
            }
            ShellyResponse::Envelope(Envelope { errors, .. }) => Err(errors
                .map(|e| e.to_string())
                .unwrap_or_else(|| "isok=false".to_string())),
        }
    }
}
