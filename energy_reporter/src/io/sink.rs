use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The sink URL does not parse.
    #[snafu(display("Invalid sink URL '{url}': {source}"))]
    InvalidUrl {
        url: String,
        source: url::ParseError,
        backtrace: Backtrace,
    },

    /// The sink URL is not an http(s) URL.
    #[snafu(display("Sink URL '{url}' must use http or https"))]
    UnsupportedScheme { url: String, backtrace: Backtrace },

    /// The sink could not be reached or the response could not be read.
    #[snafu(display("Failed to submit report: {source}"))]
    Submit {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// What the sink answered. Kept for diagnostics only; its content is not
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardReceipt {
    /// HTTP status of the submission.
    pub status: u16,
    /// Number of distinct fields sent.
    pub fields: usize,
    /// Raw response body.
    pub body: String,
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Submits all `(destination_field_id, value)` pairs in a single request.
    ///
    /// # Arguments
    /// * `values` - Normalized values, in configuration order.
    async fn forward(&self, values: &[(String, f64)]) -> Result<ForwardReceipt, SinkError>;
}
