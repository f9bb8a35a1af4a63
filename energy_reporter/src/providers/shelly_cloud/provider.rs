use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::SecretString;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    models::{
        consumption::ConsumptionRecord, endpoint::DeviceEndpointConfig, time_window::TimeWindow,
    },
    providers::{
        ApiSnafu, DecodeSnafu, DeviceReader, InvalidEndpointSnafu,
        ProviderInitError, ReadError, RequestSnafu, StatusSnafu, UnsupportedSchemeSnafu,
        shelly_cloud::{params::construct_query, response::ShellyResponse},
    },
};

pub struct ShellyCloudProvider {
    client: Client,
    endpoint: Url,
    auth_key: SecretString,
}

impl ShellyCloudProvider {
    /// Creates a provider for the statistics endpoint at `endpoint`, sending
    /// through the shared `client`.
    ///
    /// `auth_key` is the account-wide cloud key; it is sent in the form body
    /// of every request and never logged.
    pub fn with_client(
        client: Client,
        endpoint: &str,
        auth_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        let url = Url::parse(endpoint).context(InvalidEndpointSnafu { url: endpoint })?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            UnsupportedSchemeSnafu { url: endpoint }
        );
        Ok(Self {
            client,
            endpoint: url,
            auth_key,
        })
    }
}

#[async_trait]
impl DeviceReader for ShellyCloudProvider {
    async fn read_consumption(
        &self,
        endpoint: &DeviceEndpointConfig,
        window: &TimeWindow,
    ) -> Result<ConsumptionRecord, ReadError> {
        let device_id = endpoint.device_id.as_str();
        debug!(device_id, %window, "querying consumption");

        let query = construct_query(endpoint, window, &self.auth_key);
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&query)
            .send()
            .await
            .context(RequestSnafu { device_id })?;

        let status = response.status();
        let body = response.text().await.context(RequestSnafu { device_id })?;

        if !status.is_success() {
            return StatusSnafu {
                device_id,
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        debug!(device_id, body = %body, "consumption response");
        let parsed = ShellyResponse::from_body(&body).context(DecodeSnafu { device_id })?;
        let data = match parsed.into_data() {
            Ok(data) => data,
            Err(message) => return ApiSnafu { device_id, message }.fail(),
        };

        Ok(ConsumptionRecord::from_data(endpoint, data))
    }
}
