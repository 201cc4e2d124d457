//! # Datadog Log Shipper
//!
//! Buffers structured log records from a host logging pipeline and ships
//! them in batches to the Datadog logs intake.
//!
//! ## Features
//!
//! - **Non-blocking**: log calls only filter, render and enqueue; delivery
//!   runs on a background thread
//! - **Batching**: periodic flushes, or one request per record when the
//!   interval is zero
//! - **Cycle-safe rendering**: self-referencing objects print once with a
//!   `[Circular]` marker
//! - **Module filtering**: per-module thresholds and an exclusion list that
//!   still lets critical broker records through

pub mod core;
pub mod delivery;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        Bindings, DatadogShipper, LevelMap, LogHandler, LogLevel, LogRecord, LogValue,
        LoggerBackend, ObjectPrinter, Result, SharedArray, SharedObject, ShipperConfig,
        ShipperError, ShipperMetrics, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::delivery::{FlushHandle, HttpTransport, Transport};
}

pub use crate::core::{
    Bindings, DatadogShipper, LevelMap, LogHandler, LogLevel, LogRecord, LogValue, LoggerBackend,
    ModuleFilter, ObjectPrinter, Result, Serializer, SharedArray, SharedObject, ShipperConfig,
    ShipperConfigBuilder, ShipperError, ShipperMetrics, ShipperState, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::delivery::{DeliveryRequest, FlushHandle, HttpTransport, Transport};
