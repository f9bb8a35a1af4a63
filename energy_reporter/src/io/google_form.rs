//! Google Form submission.
//!
//! A form accepts `POST {form_url}` with an urlencoded body whose keys are the
//! question ids (`entry.NNNN`). The endpoint answers 200 with an HTML page
//! even when a value is rejected, so the response body is logged and
//! otherwise ignored.

use async_trait::async_trait;
use indexmap::IndexMap;
use indexmap::map::Entry;
use reqwest::{Client, Url};
use snafu::{ResultExt, ensure};
use tracing::{debug, info, warn};

use crate::io::sink::{
    ForwardReceipt, InvalidUrlSnafu, ReportSink, SinkError, SubmitSnafu, UnsupportedSchemeSnafu,
};

pub struct GoogleFormSink {
    client: Client,
    url: Url,
}

impl GoogleFormSink {
    pub fn new(client: Client, url: &str) -> Result<Self, SinkError> {
        let parsed = Url::parse(url).context(InvalidUrlSnafu { url })?;
        ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            UnsupportedSchemeSnafu { url }
        );
        Ok(Self { client, url: parsed })
    }
}

/// Builds the form body, one entry per destination field.
///
/// A field listed twice keeps its first position but takes the later value,
/// like repeated keys in a plain form post.
pub fn build_form(values: &[(String, f64)]) -> IndexMap<String, String> {
    let mut form = IndexMap::with_capacity(values.len());
    for (field, value) in values {
        let rendered = format_value(*value);
        match form.entry(field.clone()) {
            Entry::Occupied(mut slot) => {
                warn!(field = %field, previous = %slot.get(), value = %rendered, "duplicate destination field, overwriting");
                slot.insert(rendered);
            }
            Entry::Vacant(slot) => {
                slot.insert(rendered);
            }
        }
    }
    form
}

/// Shortest decimal rendering: `2` rather than `2.0`, `1.5`, `0.123`.
pub fn format_value(value: f64) -> String {
    format!("{value}")
}

#[async_trait]
impl ReportSink for GoogleFormSink {
    async fn forward(&self, values: &[(String, f64)]) -> Result<ForwardReceipt, SinkError> {
        let form = build_form(values);
        let pairs: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        debug!(?pairs, "submitting report");

        let response = self
            .client
            .post(self.url.clone())
            .form(&pairs)
            .send()
            .await
            .context(SubmitSnafu)?;
        let status = response.status();
        let body = response.text().await.context(SubmitSnafu)?;

        if status.is_success() {
            info!(status = status.as_u16(), fields = form.len(), "report submitted");
        } else {
            warn!(status = status.as_u16(), fields = form.len(), "sink answered with an error status");
        }
        debug!(body = %body, "sink response");

        Ok(ForwardReceipt {
            status: status.as_u16(),
            fields: form.len(),
            body,
        })
    }
}
