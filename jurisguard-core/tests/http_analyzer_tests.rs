// jurisguard-core/tests/http_analyzer_tests.rs
//! Engine runs backed by a mocked Presidio-compatible analyzer service.

use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use jurisguard_core::{secure_text_async, AnalyzerConfig, EngineHandle, RedactorConfig, RedactorError};

fn config_for(server: &Server) -> RedactorConfig {
    RedactorConfig {
        builtin_recognizers: false,
        analyzer: AnalyzerConfig {
            endpoint: Some(server.url()),
            timeout_ms: 2_000,
            health_check: true,
        },
        ..Default::default()
    }
}

#[test]
fn test_engine_uses_remote_analyzer_results() {
    let mut server = Server::new();
    let health = server.mock("GET", "/health").with_status(200).create();
    let analyze = server
        .mock("POST", "/analyze")
        .match_body(Matcher::PartialJson(json!({ "language": "en" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"entity_type":"PERSON","start":8,"end":14,"score":0.85}]"#)
        .create();

    let engine = EngineHandle::from_config(&config_for(&server)).unwrap();
    let out = engine.secure_text("Contact Zoë M. today", None).unwrap();

    health.assert();
    analyze.assert();
    assert_eq!(out, "Contact <PARTY> today");
}

#[test]
fn test_failed_health_check_prevents_construction() {
    let mut server = Server::new();
    let _health = server.mock("GET", "/health").with_status(503).create();

    let err = EngineHandle::from_config(&config_for(&server)).unwrap_err();
    assert!(matches!(err, RedactorError::EngineUnavailable(_)));
}

#[test]
fn test_analyzer_outage_after_startup_fails_closed() {
    let mut server = Server::new();
    let _health = server.mock("GET", "/health").with_status(200).create();
    let _analyze = server.mock("POST", "/analyze").with_status(502).create();

    let engine = EngineHandle::from_config(&config_for(&server)).unwrap();
    let err = engine.secure_text("Contact John Smith", None).unwrap_err();
    assert!(matches!(err, RedactorError::EngineUnavailable(_)));
    assert!(!err.to_string().contains("John Smith"));
}

#[test]
fn test_out_of_range_span_is_rejected() {
    let mut server = Server::new();
    let _health = server.mock("GET", "/health").with_status(200).create();
    let _analyze = server
        .mock("POST", "/analyze")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"entity_type":"PERSON","start":0,"end":400,"score":0.9}]"#)
        .create();

    let engine = EngineHandle::from_config(&config_for(&server)).unwrap();
    let err = engine.secure_text("short text", None).unwrap_err();
    assert!(matches!(err, RedactorError::EngineUnavailable(_)));
}

#[tokio::test]
async fn test_engine_builds_and_runs_inside_tokio_runtime() {
    let mut server = Server::new_async().await;
    let health = server.mock("GET", "/health").with_status(200).create_async().await;
    let _analyze = server
        .mock("POST", "/analyze")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"entity_type":"PERSON","start":8,"end":14,"score":0.85}]"#)
        .create_async()
        .await;

    let engine = Arc::new(EngineHandle::from_config(&config_for(&server)).unwrap());
    health.assert_async().await;

    let out = secure_text_async(Arc::clone(&engine), "Contact Zoë M. today".to_string(), None)
        .await
        .unwrap();
    assert_eq!(out, "Contact <PARTY> today");
    drop(engine);
}

#[test]
fn test_slow_analyzer_is_cut_off_at_the_detection_timeout() {
    let mut server = Server::new();
    let _analyze = server
        .mock("POST", "/analyze")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            thread::sleep(Duration::from_secs(3));
            w.write_all(b"[]")
        })
        .create();

    let config = RedactorConfig {
        detection_timeout_ms: Some(100),
        analyzer: AnalyzerConfig {
            health_check: false,
            timeout_ms: 10_000,
            ..config_for(&server).analyzer
        },
        ..config_for(&server)
    };
    let engine = EngineHandle::from_config(&config).unwrap();

    let started = Instant::now();
    let err = engine.secure_text("Contact John Smith", None).unwrap_err();
    assert!(matches!(err, RedactorError::DetectionTimeout { budget_ms: 100 }));
    assert!(started.elapsed() < Duration::from_secs(2));
}
