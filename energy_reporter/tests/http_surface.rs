mod common;

use std::{net::SocketAddr, sync::Arc};

use axum::http::StatusCode;
use energy_reporter::server;

use common::{A_WH, B_KWH, FakeMeter, FakeSink, config, config_with, pipeline, spawn};

struct Harness {
    addr: SocketAddr,
    meter: Arc<FakeMeter>,
    sink: Arc<FakeSink>,
    client: reqwest::Client,
}

impl Harness {
    async fn start(enable_web: bool) -> Self {
        let (meter, meter_url) = FakeMeter::default().answer("A", A_WH).answer("B", B_KWH).start().await;
        let (sink, sink_url) = FakeSink::new(StatusCode::OK).start().await;
        let cfg = if enable_web {
            config_with(&meter_url, &sink_url, "A,B", "entry1,entry2", &[("ENABLE_WEB", "true")])
        } else {
            config(&meter_url, &sink_url, "A,B", "entry1,entry2")
        };
        let addr = spawn(server::router(pipeline(&cfg), cfg.enable_web)).await;
        Self {
            addr,
            meter,
            sink,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

#[tokio::test]
async fn get_root_serves_the_form() {
    let h = Harness::start(true).await;

    let resp = h.client.get(h.url("/")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"name="date_to""#));
    assert!(html.contains(r#"action="/report""#));
    assert_eq!(h.meter.request_count(), 0);
}

#[tokio::test]
async fn manual_report_without_date_is_rejected_before_any_read() {
    let h = Harness::start(true).await;

    let resp = h.client.post(h.url("/")).form(&[("other", "x")]).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "date_to missing.");

    let resp = h.client.post(h.url("/")).form(&[("date_to", "")]).send().await.unwrap();
    assert_eq!(resp.status(), 400);

    assert_eq!(h.meter.request_count(), 0);
    assert!(h.sink.bodies().is_empty());
}

#[tokio::test]
async fn manual_report_without_body_is_a_bad_request() {
    let h = Harness::start(true).await;

    let resp = h.client.post(h.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "date_to missing.");

    let resp = h
        .client
        .post(h.url("/"))
        .header("content-type", "application/json")
        .body(r#"{"date_to":"2024-03-09"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert_eq!(h.meter.request_count(), 0);
}

#[tokio::test]
async fn manual_report_accepts_multipart() {
    let h = Harness::start(true).await;

    let form = reqwest::multipart::Form::new().text("date_to", "2024-03-09");
    let resp = h.client.post(h.url("/")).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Device A: 2000 Wh\nDevice B: 3 kWh\n");

    let empty = reqwest::multipart::Form::new().text("other", "x");
    let resp = h.client.post(h.url("/")).multipart(empty).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(h.meter.request_count(), 2);
}

#[tokio::test]
async fn manual_report_lists_each_device() {
    let h = Harness::start(true).await;

    let resp = h
        .client
        .post(h.url("/"))
        .form(&[("date_to", "2024-03-09")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Device A: 2000 Wh\nDevice B: 3 kWh\n");
    assert_eq!(h.meter.request_count(), 2);
    assert_eq!(h.sink.bodies(), vec!["entry1=2&entry2=3".to_string()]);
}

#[tokio::test]
async fn report_endpoint_acknowledges() {
    let h = Harness::start(true).await;

    let resp = h.client.post(h.url("/report")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OKAY!");
    assert_eq!(h.sink.bodies().len(), 1);
}

#[tokio::test]
async fn failed_run_is_a_server_error() {
    let (_meter, meter_url) = FakeMeter::default()
        .answer("A", A_WH)
        .fail("B", StatusCode::SERVICE_UNAVAILABLE)
        .start()
        .await;
    let (sink, sink_url) = FakeSink::new(StatusCode::OK).start().await;
    let cfg = config_with(&meter_url, &sink_url, "A,B", "entry1,entry2", &[("ENABLE_WEB", "1")]);
    let addr = spawn(server::router(pipeline(&cfg), cfg.enable_web)).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/report"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    assert!(resp.text().await.unwrap().contains("device B"));
    assert!(sink.bodies().is_empty());
}

#[tokio::test]
async fn unknown_routes_and_methods_are_not_found() {
    let h = Harness::start(true).await;

    for req in [
        h.client.get(h.url("/nope")),
        h.client.get(h.url("/report")),
        h.client.delete(h.url("/")),
    ] {
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.text().await.unwrap(), "Not Found.");
    }
    assert_eq!(h.meter.request_count(), 0);
}

#[tokio::test]
async fn disabled_surface_answers_404_everywhere() {
    let h = Harness::start(false).await;

    for req in [
        h.client.get(h.url("/")),
        h.client.post(h.url("/")).form(&[("date_to", "2024-03-09")]),
        h.client.post(h.url("/report")),
        h.client.get(h.url("/anything")),
    ] {
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.text().await.unwrap(), "There is nothing here yet");
    }
    assert_eq!(h.meter.request_count(), 0);
    assert!(h.sink.bodies().is_empty());
}
