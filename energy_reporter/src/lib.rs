//! Daily energy reporting: read consumption from Shelly Cloud meters, convert
//! it to kWh and submit all values in a single Google Form response.
//!
//! The pipeline is assembled from small pieces that can be used on their own:
//!
//! - [`models::endpoint::map_endpoints`] pairs devices with form fields
//! - [`models::time_window::TimeWindow`] computes the queried day
//! - [`providers::DeviceReader`] reads one device ([`providers::shelly_cloud`])
//! - [`collect::collect_readings`] reads all devices concurrently
//! - [`normalize::normalize`] converts to kWh
//! - [`io::sink::ReportSink`] forwards the values ([`io::google_form`])
//! - [`pipeline::ReportPipeline`] ties them together per [`pipeline::Trigger`]

pub mod collect;
pub mod config;
pub mod errors;
pub mod io;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod scheduler;
pub mod server;

pub use errors::{Error, Result};
pub use pipeline::{ReportPipeline, RunSummary, Trigger};
