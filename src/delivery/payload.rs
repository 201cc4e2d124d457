//! Wire format for the logs intake
//!
//! A batch is sent as one JSON array:
//!
//! ```json
//! [{"timestamp":1700000000000,"level":"info","message":"hello world",
//!   "nodeID":"node-1","namespace":"prod","service":"users",
//!   "ddsource":"moleculer","ddtags":"env:prod,nodeID:node-1,namespace:prod,service:users",
//!   "hostname":"web-1"}]
//! ```

use crate::core::{build_tags, LogLevel, LogRecord, Result, ShipperConfig};
use serde::Serialize;

/// Per-shipper values copied into every entry.
#[derive(Debug, Clone)]
pub struct PayloadContext {
    pub source: String,
    pub env: Option<String>,
    pub hostname: String,
}

impl PayloadContext {
    pub fn from_config(config: &ShipperConfig) -> Self {
        Self {
            source: config.source.clone(),
            env: config.env.clone(),
            hostname: config.hostname.clone(),
        }
    }
}

/// One entry of the JSON array.
#[derive(Debug, Serialize)]
pub struct PayloadEntry<'a> {
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: &'a str,
    #[serde(rename = "nodeID")]
    pub node_id: &'a str,
    pub namespace: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    pub ddsource: &'a str,
    pub ddtags: String,
    pub hostname: &'a str,
}

impl<'a> PayloadEntry<'a> {
    pub fn new(record: &'a LogRecord, context: &'a PayloadContext) -> Self {
        let bindings = &record.bindings;
        Self {
            timestamp: record.timestamp,
            level: record.level,
            message: &record.message,
            node_id: &bindings.node_id,
            namespace: &bindings.namespace,
            service: bindings.service.as_deref(),
            version: bindings.version.as_deref(),
            ddsource: &context.source,
            ddtags: build_tags(context.env.as_deref(), bindings),
            hostname: &context.hostname,
        }
    }
}

/// Serialize a batch into the request body.
pub fn encode_batch(batch: &[LogRecord], context: &PayloadContext) -> Result<Vec<u8>> {
    let entries: Vec<PayloadEntry<'_>> = batch
        .iter()
        .map(|record| PayloadEntry::new(record, context))
        .collect();
    Ok(serde_json::to_vec(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Bindings;
    use std::sync::Arc;

    fn context() -> PayloadContext {
        PayloadContext {
            source: "moleculer".to_string(),
            env: Some("prod".to_string()),
            hostname: "web-1".to_string(),
        }
    }

    #[test]
    fn test_entry_fields() -> Result<()> {
        let bindings = Arc::new(
            Bindings::new("users", "node-1", "prod")
                .with_service("users")
                .with_version("2"),
        );
        let batch = vec![LogRecord::at(
            1_700_000_000_000,
            LogLevel::Warn,
            "slow query".to_string(),
            bindings,
        )];

        let body = encode_batch(&batch, &context())?;
        let parsed: serde_json::Value = serde_json::from_slice(&body)?;

        assert_eq!(
            parsed,
            serde_json::json!([{
                "timestamp": 1_700_000_000_000i64,
                "level": "warn",
                "message": "slow query",
                "nodeID": "node-1",
                "namespace": "prod",
                "service": "users",
                "version": "2",
                "ddsource": "moleculer",
                "ddtags": "env:prod,nodeID:node-1,namespace:prod,service:users",
                "hostname": "web-1"
            }])
        );
        Ok(())
    }

    #[test]
    fn test_absent_service_and_version_omitted() -> Result<()> {
        let bindings = Arc::new(Bindings::new("broker", "node-1", "prod"));
        let batch = vec![LogRecord::at(1, LogLevel::Info, "up".to_string(), bindings)];

        let body = encode_batch(&batch, &context())?;
        let parsed: serde_json::Value = serde_json::from_slice(&body)?;
        let entry = &parsed[0];

        assert!(entry.get("service").is_none());
        assert!(entry.get("version").is_none());
        assert_eq!(entry["ddtags"], "env:prod,nodeID:node-1,namespace:prod");
        Ok(())
    }

    #[test]
    fn test_batch_order_preserved() -> Result<()> {
        let bindings = Arc::new(Bindings::new("users", "n", "ns"));
        let batch: Vec<LogRecord> = (0..5)
            .map(|i| LogRecord::at(i, LogLevel::Info, format!("m{}", i), bindings.clone()))
            .collect();

        let body = encode_batch(&batch, &context())?;
        let parsed: serde_json::Value = serde_json::from_slice(&body)?;
        let messages: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["message"].as_str().unwrap())
            .collect();

        assert_eq!(messages, ["m0", "m1", "m2", "m3", "m4"]);
        Ok(())
    }
}
