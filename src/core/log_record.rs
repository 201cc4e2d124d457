//! Log record and the contextual bindings attached to it

use super::log_level::LogLevel;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Context supplied by the host for every logger it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    /// Originating module (e.g. `broker`, `registry`, `users`)
    pub module: String,
    #[serde(rename = "nodeID")]
    pub node_id: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Bindings {
    pub fn new(
        module: impl Into<String>,
        node_id: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            node_id: node_id.into(),
            namespace: namespace.into(),
            service: None,
            version: None,
        }
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A log call that passed the filter. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: i64,
    pub level: LogLevel,
    pub message: String,
    pub bindings: Arc<Bindings>,
}

impl LogRecord {
    /// Build a record stamped with the current time.
    pub fn new(level: LogLevel, message: String, bindings: Arc<Bindings>) -> Self {
        Self::at(Utc::now().timestamp_millis(), level, message, bindings)
    }

    /// Build a record with an explicit timestamp.
    pub fn at(timestamp: i64, level: LogLevel, message: String, bindings: Arc<Bindings>) -> Self {
        Self {
            timestamp,
            level,
            message,
            bindings,
        }
    }
}
