#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use energy_reporter::{config::ReporterConfig, pipeline::ReportPipeline};
use tokio::net::TcpListener;

/// Serves `app` on an ephemeral localhost port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

/// Canned statistics API: one scripted answer per device id.
#[derive(Default)]
pub struct FakeMeter {
    responses: HashMap<String, (StatusCode, String, Duration)>,
    pub requests: Mutex<Vec<HashMap<String, String>>>,
}

impl FakeMeter {
    pub fn answer(mut self, device_id: &str, body: &str) -> Self {
        self.responses
            .insert(device_id.into(), (StatusCode::OK, body.into(), Duration::ZERO));
        self
    }

    pub fn answer_after(mut self, device_id: &str, body: &str, delay: Duration) -> Self {
        self.responses
            .insert(device_id.into(), (StatusCode::OK, body.into(), delay));
        self
    }

    pub fn fail(mut self, device_id: &str, status: StatusCode) -> Self {
        self.responses
            .insert(device_id.into(), (status, "upstream exploded".into(), Duration::ZERO));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub async fn start(self) -> (Arc<Self>, String) {
        let state = Arc::new(self);
        let app = Router::new()
            .route("/statistics/relay/consumption", post(statistics))
            .with_state(state.clone());
        let addr = spawn(app).await;
        (state, format!("http://{addr}/statistics/relay/consumption"))
    }
}

async fn statistics(
    State(meter): State<Arc<FakeMeter>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    let id = form.get("id").cloned().unwrap_or_default();
    meter.requests.lock().unwrap().push(form);
    match meter.responses.get(&id) {
        Some((status, body, delay)) => {
            tokio::time::sleep(*delay).await;
            (*status, body.clone())
        }
        None => (StatusCode::NOT_FOUND, format!("unknown device {id}")),
    }
}

/// Records every raw form body it receives.
pub struct FakeSink {
    status: StatusCode,
    pub bodies: Mutex<Vec<String>>,
}

impl FakeSink {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            bodies: Mutex::new(Vec::new()),
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    pub async fn start(self) -> (Arc<Self>, String) {
        let state = Arc::new(self);
        let app = Router::new()
            .route("/formResponse", post(submit))
            .with_state(state.clone());
        let addr = spawn(app).await;
        (state, format!("http://{addr}/formResponse"))
    }
}

async fn submit(State(sink): State<Arc<FakeSink>>, body: String) -> (StatusCode, &'static str) {
    sink.bodies.lock().unwrap().push(body);
    (sink.status, "<html>Your response has been recorded.</html>")
}

pub fn config(meter_url: &str, sink_url: &str, ids: &str, entries: &str) -> ReporterConfig {
    config_with(meter_url, sink_url, ids, entries, &[])
}

pub fn config_with(
    meter_url: &str,
    sink_url: &str,
    ids: &str,
    entries: &str,
    extra: &[(&str, &str)],
) -> ReporterConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SHELLY_URL".to_string(), meter_url.to_string()),
        ("SHELLY_AUTH_KEY".to_string(), "test-key".to_string()),
        ("SHELLY_IDS".to_string(), ids.to_string()),
        ("GOOGLE_FORM_URL".to_string(), sink_url.to_string()),
        ("GOOGLE_FORM_ENTRIES".to_string(), entries.to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    ReporterConfig::from_lookup(|k| vars.get(k).cloned()).expect("valid test config")
}

pub fn pipeline(config: &ReporterConfig) -> Arc<ReportPipeline> {
    Arc::new(ReportPipeline::from_config(config).expect("pipeline"))
}

pub const A_WH: &str = r#"{"isok":true,"data":{"total":2000,"units":{"consumption":"Wh"},"history":[{"datetime":"2024-03-09 00:00:00","consumption":2000,"available":true}]}}"#;
pub const B_KWH: &str = r#"{"total":3,"units":{"consumption":"kWh"}}"#;
