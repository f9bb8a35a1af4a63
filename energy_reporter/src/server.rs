//! Inbound HTTP surface.
//!
//! - `GET /` renders the manual-trigger form
//! - `POST /` runs a manual report (`date_to` form field required, urlencoded
//!   or multipart)
//! - `POST /report` runs the scheduled report
//!
//! Everything else is a 404. With the web surface disabled every request is a 404.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Form, Router,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    errors::Error,
    models::time_window::format_date,
    pipeline::{ReportPipeline, Trigger},
};

pub const NOT_FOUND_BODY: &str = "Not Found.";
pub const DISABLED_BODY: &str = "There is nothing here yet";
pub const REPORT_ACK_BODY: &str = "OKAY!";

/// Error rendered as a plain-text body with a matching status code.
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %e, "report run failed");
        }
        let message = match e {
            Error::Validation(msg) => msg,
            other => other.to_string(),
        };
        AppError { status, message }
    }
}

#[derive(Debug, Deserialize)]
pub struct ManualForm {
    date_to: Option<String>,
}

/// Builds the application router.
pub fn router(pipeline: Arc<ReportPipeline>, enable_web: bool) -> Router {
    if !enable_web {
        return Router::new().fallback(disabled);
    }

    Router::new()
        .route(
            "/",
            get(show_form).post(manual_report).fallback(not_found),
        )
        .route("/report", post(scheduled_report).fallback(not_found))
        .fallback(not_found)
        .with_state(pipeline)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    app: Router,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn show_form(State(pipeline): State<Arc<ReportPipeline>>) -> Html<String> {
    let today = format_date(Utc::now().with_timezone(&pipeline.timezone()).date_naive());
    Html(render_form(&today))
}

async fn manual_report(
    State(pipeline): State<Arc<ReportPipeline>>,
    request: Request,
) -> Result<String, AppError> {
    let date_to = read_date_to(request).await;
    let trigger = Trigger::manual(date_to.as_deref())?;
    let summary = pipeline.run(trigger).await?;
    Ok(summary.to_text())
}

/// `date_to` from an urlencoded or multipart body.
///
/// A missing or unreadable body counts as a missing field.
async fn read_date_to(request: Request) -> Option<String> {
    let multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if multipart {
        let mut fields = match Multipart::from_request(request, &()).await {
            Ok(fields) => fields,
            Err(rejection) => {
                debug!(%rejection, "unreadable multipart body");
                return None;
            }
        };
        while let Ok(Some(field)) = fields.next_field().await {
            if field.name() == Some("date_to") {
                return field.text().await.ok();
            }
        }
        None
    } else {
        match Form::<ManualForm>::from_request(request, &()).await {
            Ok(Form(form)) => form.date_to,
            Err(rejection) => {
                debug!(%rejection, "unreadable form body");
                None
            }
        }
    }
}

async fn scheduled_report(
    State(pipeline): State<Arc<ReportPipeline>>,
) -> Result<&'static str, AppError> {
    pipeline.run(Trigger::Scheduled).await?;
    Ok(REPORT_ACK_BODY)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

async fn disabled() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, DISABLED_BODY)
}

fn render_form(today: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Energy report</title></head>
<body>
  <h1>Import</h1>
  <form action="/" method="post">
    <label for="date_to">Date:</label>
    <input type="date" id="date_to" name="date_to" value="{today}"><br><br>
    <input type="submit" value="Submit">
  </form>
  <h1>Report Current Status</h1>
  <form action="/report" method="post">
    <input type="submit" value="Report">
  </form>
</body>
</html>
"#
    )
}
