//! One collection-and-forwarding run.
//!
//! `Trigger` -> [`TimeWindow`] -> [`collect_readings`] -> [`normalize`] ->
//! [`ReportSink::forward`]. Nothing is forwarded unless collection succeeded.

use std::{fmt, sync::Arc};

use chrono_tz::Tz;
use reqwest::Client;
use tracing::{info, instrument};

use crate::{
    collect::{CollectOptions, collect_readings},
    config::ReporterConfig,
    errors::Error,
    io::{
        google_form::GoogleFormSink,
        sink::{ForwardReceipt, ReportSink},
    },
    models::{
        consumption::ConsumptionRecord,
        endpoint::DeviceEndpointConfig,
        time_window::{SCHEDULED_DATE_TO, TimeWindow},
    },
    normalize::normalize,
    providers::{DeviceReader, shelly_cloud::ShellyCloudProvider},
};

/// What started a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Submitted from the web form or the `collect` command.
    Manual { date_to: String },
    /// Timer, `POST /report` or the `report` command.
    Scheduled,
}

impl Trigger {
    /// Validates a caller-supplied end date.
    ///
    /// Only presence is checked. The value is carried for logging; device
    /// queries always cover the current day.
    pub fn manual(date_to: Option<&str>) -> Result<Self, Error> {
        match date_to.map(str::trim) {
            Some(d) if !d.is_empty() => Ok(Trigger::Manual {
                date_to: d.to_string(),
            }),
            _ => Err(Error::Validation("date_to missing.".into())),
        }
    }

    /// Nominal end date of the run.
    pub fn date_to(&self) -> &str {
        match self {
            Trigger::Manual { date_to } => date_to,
            Trigger::Scheduled => SCHEDULED_DATE_TO,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Manual { .. } => f.write_str("manual"),
            Trigger::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// One device's contribution to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    pub device_id: String,
    pub destination_field_id: String,
    /// Total as reported, in `unit`.
    pub total: f64,
    pub unit: String,
    /// Value sent to the sink.
    pub kwh: f64,
}

impl From<&ConsumptionRecord> for DeviceReading {
    fn from(record: &ConsumptionRecord) -> Self {
        Self {
            device_id: record.device_id.clone(),
            destination_field_id: record.destination_field_id.clone(),
            total: record.total_consumption,
            unit: record.unit.clone(),
            kwh: normalize(record),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub trigger: Trigger,
    pub window: TimeWindow,
    pub readings: Vec<DeviceReading>,
    pub receipt: ForwardReceipt,
}

impl RunSummary {
    /// Plain-text report, one line per device.
    pub fn to_text(&self) -> String {
        render_readings(&self.readings)
    }
}

/// `Device <id>: <total> <unit>` lines.
pub fn render_readings(readings: &[DeviceReading]) -> String {
    readings
        .iter()
        .map(|r| format!("Device {}: {} {}\n", r.device_id, r.total, r.unit))
        .collect()
}

/// Everything a run needs. Built once, shared read-only between triggers.
pub struct ReportPipeline {
    reader: Arc<dyn DeviceReader>,
    sink: Arc<dyn ReportSink>,
    endpoints: Vec<DeviceEndpointConfig>,
    options: CollectOptions,
    timezone: Tz,
}

impl ReportPipeline {
    pub fn new(
        reader: Arc<dyn DeviceReader>,
        sink: Arc<dyn ReportSink>,
        endpoints: Vec<DeviceEndpointConfig>,
        options: CollectOptions,
        timezone: Tz,
    ) -> Self {
        Self {
            reader,
            sink,
            endpoints,
            options,
            timezone,
        }
    }

    /// Wires the Shelly Cloud reader and the Google Form sink from `config`.
    pub fn from_config(config: &ReporterConfig) -> Result<Self, Error> {
        let endpoints = config.endpoints()?;
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        let reader = ShellyCloudProvider::with_client(
            client.clone(),
            &config.shelly_url,
            config.shelly_auth_key.clone(),
        )
        .map_err(|e| Error::Config(e.to_string()))?;
        let sink = GoogleFormSink::new(client, &config.google_form_url)
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self::new(
            Arc::new(reader),
            Arc::new(sink),
            endpoints,
            config.collect_options(),
            config.timezone,
        ))
    }

    pub fn endpoints(&self) -> &[DeviceEndpointConfig] {
        &self.endpoints
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Runs against the current day.
    pub async fn run(&self, trigger: Trigger) -> Result<RunSummary, Error> {
        self.run_for_window(trigger, TimeWindow::today(self.timezone))
            .await
    }

    /// Collects every device over `window` and forwards the normalized values.
    #[instrument(skip_all, fields(%trigger, %window))]
    pub async fn run_for_window(
        &self,
        trigger: Trigger,
        window: TimeWindow,
    ) -> Result<RunSummary, Error> {
        info!(date_to = trigger.date_to(), devices = self.endpoints.len(), "starting run");

        let readings = self.readings_for_window(&window).await?;
        let values: Vec<(String, f64)> = readings
            .iter()
            .map(|r| (r.destination_field_id.clone(), r.kwh))
            .collect();
        let receipt = self.sink.forward(&values).await?;

        info!(status = receipt.status, fields = receipt.fields, "run finished");
        Ok(RunSummary {
            trigger,
            window,
            readings,
            receipt,
        })
    }

    /// Collects and normalizes without forwarding.
    pub async fn readings_for_window(&self, window: &TimeWindow) -> Result<Vec<DeviceReading>, Error> {
        let records =
            collect_readings(self.reader.as_ref(), &self.endpoints, window, self.options).await?;
        Ok(records.iter().map(DeviceReading::from).collect())
    }
}
