//! Integration tests for the log shipper
//!
//! These tests verify:
//! - Batching by timer and immediate mode
//! - Order preservation across batches
//! - Level and module filtering through handlers
//! - Wire format and HTTP delivery
//! - Failure isolation

use datadog_log_shipper::prelude::*;
use datadog_log_shipper::{dd_error, dd_info, DeliveryRequest};
use mockito::{Matcher, Server};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Transport that keeps every body it is asked to send
#[derive(Clone, Default)]
struct RecordingTransport {
    batches: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl RecordingTransport {
    fn batches(&self) -> Vec<serde_json::Value> {
        self.batches.lock().clone()
    }

    fn messages(&self) -> Vec<Vec<String>> {
        self.batches()
            .iter()
            .map(|batch| {
                batch
                    .as_array()
                    .expect("batch is a JSON array")
                    .iter()
                    .map(|entry| entry["message"].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: DeliveryRequest) -> Result<()> {
        self.batches
            .lock()
            .push(serde_json::from_slice(&request.body)?);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Transport that fails the first `failures` sends
struct FlakyTransport {
    failures: Mutex<usize>,
    inner: RecordingTransport,
}

impl Transport for FlakyTransport {
    fn send(&self, request: DeliveryRequest) -> Result<()> {
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(ShipperError::transport("connection reset by peer"));
        }
        drop(failures);
        self.inner.send(request)
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

fn config(interval_ms: u64) -> ShipperConfig {
    ShipperConfig::builder()
        .api_key("test-api-key")
        .env("prod")
        .hostname("web-1")
        .flush_interval_ms(interval_ms)
        .build()
        .expect("valid config")
}

fn recording_shipper(config: ShipperConfig) -> (DatadogShipper, RecordingTransport) {
    let transport = RecordingTransport::default();
    let shipper = DatadogShipper::with_transport(config, Box::new(transport.clone()))
        .expect("shipper starts");
    (shipper, transport)
}

fn users(shipper: &DatadogShipper) -> LogHandler {
    shipper
        .get_log_handler(Bindings::new("users", "node-1", "ns").with_service("users"))
        .expect("users module enabled")
}

#[test]
fn test_records_between_ticks_form_one_batch() {
    let (shipper, transport) = recording_shipper(config(60_000));
    shipper.init().unwrap();
    let handler = users(&shipper);

    for i in 0..5 {
        dd_info!(handler, "message", i);
    }
    assert_eq!(shipper.pending(), 5);
    assert!(transport.batches().is_empty());

    shipper.flush().wait();

    assert_eq!(
        transport.messages(),
        vec![vec![
            "message 0",
            "message 1",
            "message 2",
            "message 3",
            "message 4"
        ]]
    );
    shipper.stop().wait();
}

#[test]
fn test_immediate_mode_delivers_each_record() {
    let (shipper, transport) = recording_shipper(config(0));
    shipper.init().unwrap();
    let handler = users(&shipper);

    dd_info!(handler, "first");
    dd_info!(handler, "second");
    shipper.stop().wait();

    assert_eq!(
        transport.messages(),
        vec![vec!["first".to_string()], vec!["second".to_string()]]
    );
}

#[test]
fn test_order_preserved_across_batches() {
    let (shipper, transport) = recording_shipper(config(60_000));
    let handler = users(&shipper);

    let mut expected = Vec::new();
    for batch in 0..4 {
        for i in 0..(batch + 1) * 3 {
            let message = format!("b{}-{}", batch, i);
            handler.info(&[message.as_str().into()]);
            expected.push(message);
        }
        shipper.flush();
    }
    shipper.stop().wait();

    let delivered: Vec<String> = transport.messages().into_iter().flatten().collect();
    assert_eq!(delivered, expected);
    assert_eq!(transport.batches().len(), 4);
}

#[test]
fn test_timer_drives_flush() {
    let (shipper, transport) = recording_shipper(config(25));
    shipper.init().unwrap();
    let handler = users(&shipper);

    dd_info!(handler, "tick");
    std::thread::sleep(Duration::from_millis(250));

    assert_eq!(shipper.pending(), 0);
    shipper.stop().wait();
    assert_eq!(transport.messages(), vec![vec!["tick".to_string()]]);
}

#[test]
fn test_appends_between_ticks_ship_as_one_batch() {
    let (shipper, transport) = recording_shipper(config(200));
    shipper.init().unwrap();
    let handler = users(&shipper);

    let expected: Vec<String> = (0..20).map(|i| format!("burst {}", i)).collect();
    for message in &expected {
        handler.info(&[message.as_str().into()]);
    }
    assert_eq!(shipper.pending(), expected.len());

    // First tick at 200ms drains the burst, the second finds nothing
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(shipper.pending(), 0);
    assert_eq!(shipper.metrics().batches_flushed(), 1);

    shipper.stop().wait();
    assert_eq!(transport.messages(), vec![expected]);
    assert_eq!(shipper.metrics().batches_delivered(), 1);
}

#[test]
fn test_stop_twice_does_not_resend() {
    let (shipper, transport) = recording_shipper(config(60_000));
    shipper.init().unwrap();
    dd_info!(users(&shipper), "final");

    shipper.stop().wait();
    shipper.stop().wait();

    assert_eq!(transport.batches().len(), 1);
    assert!(!shipper.is_running());
}

#[test]
fn test_excluded_broker_keeps_only_critical() {
    let config = ShipperConfig::builder()
        .api_key("test-api-key")
        .hostname("web-1")
        .flush_interval_ms(60_000)
        .exclude_modules(["broker", "registry"])
        .levels(LevelMap::uniform(LogLevel::Trace))
        .build()
        .unwrap();
    let (shipper, transport) = recording_shipper(config);

    let broker = shipper
        .get_log_handler(Bindings::new("broker", "node-1", "ns"))
        .unwrap();
    let registry = shipper
        .get_log_handler(Bindings::new("registry", "node-1", "ns"))
        .unwrap();

    dd_info!(broker, "broker info");
    dd_error!(broker, "broker error");
    broker.fatal(&["broker fatal".into()]);
    dd_error!(registry, "registry error");
    shipper.flush().wait();

    assert_eq!(
        transport.messages(),
        vec![vec!["broker error".to_string(), "broker fatal".to_string()]]
    );
    assert_eq!(shipper.metrics().records_filtered(), 2);
}

#[test]
fn test_entry_wire_format() {
    let (shipper, transport) = recording_shipper(config(60_000));
    let handler = shipper
        .get_log_handler(
            Bindings::new("users", "node-1", "ns")
                .with_service("users")
                .with_version("2"),
        )
        .unwrap();

    dd_info!(handler, "hello", "world");
    shipper.flush().wait();

    let entry = &transport.batches()[0][0];
    assert!(entry["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(entry["level"], "info");
    assert_eq!(entry["message"], "hello world");
    assert_eq!(entry["nodeID"], "node-1");
    assert_eq!(entry["namespace"], "ns");
    assert_eq!(entry["service"], "users");
    assert_eq!(entry["version"], "2");
    assert_eq!(entry["ddsource"], "moleculer");
    assert_eq!(entry["ddtags"], "env:prod,nodeID:node-1,namespace:ns,service:users");
    assert_eq!(entry["hostname"], "web-1");
}

#[test]
fn test_cyclic_argument_is_logged() {
    let (shipper, transport) = recording_shipper(config(60_000));
    let handler = users(&shipper);

    let a = SharedObject::new().with_field("name", "a");
    a.set("self", a.clone());

    dd_info!(handler, "first", a.clone());
    dd_info!(handler, "second", a);
    shipper.flush().wait();

    let expected = r#"{"name":"a","self":"[Circular]"}"#;
    assert_eq!(
        transport.messages(),
        vec![vec![
            format!("first {}", expected),
            format!("second {}", expected)
        ]]
    );
}

#[test]
fn test_custom_object_printer() {
    let config = ShipperConfig::builder()
        .api_key("test-api-key")
        .hostname("web-1")
        .flush_interval_ms(60_000)
        .object_printer(Arc::new(|value: &LogValue| match value {
            LogValue::Object(obj) => format!("<{} fields>", obj.len()),
            _ => "<array>".to_string(),
        }))
        .build()
        .unwrap();
    let (shipper, transport) = recording_shipper(config);

    dd_info!(users(&shipper), "payload", SharedObject::new().with_field("a", 1));
    shipper.flush().wait();

    assert_eq!(transport.messages(), vec![vec!["payload <1 fields>".to_string()]]);
}

#[test]
fn test_delivery_failure_does_not_affect_later_batches() {
    let recorder = RecordingTransport::default();
    let transport = FlakyTransport {
        failures: Mutex::new(1),
        inner: recorder.clone(),
    };
    let shipper = DatadogShipper::with_transport(config(60_000), Box::new(transport)).unwrap();
    let handler = users(&shipper);

    dd_info!(handler, "lost");
    shipper.flush().wait();
    dd_info!(handler, "delivered");
    shipper.flush().wait();

    assert_eq!(recorder.messages(), vec![vec!["delivered".to_string()]]);
    assert_eq!(shipper.metrics().batches_failed(), 1);
    assert_eq!(shipper.metrics().records_lost(), 1);
    assert_eq!(shipper.metrics().batches_delivered(), 1);
}

#[test]
fn test_http_delivery_end_to_end() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v2/logs")
        .match_header("DD-API-KEY", "test-api-key")
        .match_header("Content-Type", "application/json")
        .match_body(Matcher::PartialJsonString(
            r#"[{"message":"over the wire","ddsource":"moleculer","hostname":"web-1"}]"#
                .to_string(),
        ))
        .with_status(202)
        .expect(1)
        .create();

    let config = ShipperConfig::builder()
        .url(format!("{}/api/v2/logs", server.url()))
        .api_key("test-api-key")
        .hostname("web-1")
        .flush_interval_ms(60_000)
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let shipper = DatadogShipper::new(config).unwrap();

    dd_info!(users(&shipper), "over the wire");
    assert!(shipper.stop().wait_timeout(Duration::from_secs(10)));

    mock.assert();
    assert_eq!(shipper.metrics().batches_delivered(), 1);
}

#[test]
fn test_http_error_status_is_swallowed() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v2/logs")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(2)
        .create();

    let config = ShipperConfig::builder()
        .url(format!("{}/api/v2/logs", server.url()))
        .api_key("test-api-key")
        .hostname("web-1")
        .flush_interval_ms(0)
        .build()
        .unwrap();
    let shipper = DatadogShipper::new(config).unwrap();
    let handler = users(&shipper);

    dd_info!(handler, "one");
    dd_info!(handler, "two");
    assert!(shipper.stop().wait_timeout(Duration::from_secs(10)));

    // One request per batch, never retried
    mock.assert();
    assert_eq!(shipper.metrics().batches_failed(), 2);
}

#[test]
fn test_missing_api_key_prevents_construction() {
    let result = ShipperConfig::builder().api_key("").hostname("web-1").build();
    assert!(matches!(result, Err(ShipperError::MissingApiKey)));
}
