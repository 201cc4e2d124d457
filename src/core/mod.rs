//! Core shipper types and traits

pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod hostname;
pub mod log_level;
pub mod log_record;
pub mod log_value;
pub mod metrics;
pub mod serializer;
pub mod shipper;
pub mod tags;

pub use backend::{LogHandler, LoggerBackend};
pub use config::{
    ShipperConfig, ShipperConfigBuilder, API_KEY_ENV, DEFAULT_FLUSH_INTERVAL, DEFAULT_SOURCE,
    DEFAULT_URL,
};
pub use error::{Result, ShipperError};
pub use filter::{LevelMap, ModuleFilter, DEFAULT_CORE_MODULE, DEFAULT_CRITICAL_LEVEL};
pub use hostname::get_hostname;
pub use log_level::LogLevel;
pub use log_record::{Bindings, LogRecord};
pub use log_value::{LogValue, SharedArray, SharedObject};
pub use metrics::ShipperMetrics;
pub use serializer::{
    format_number, json_printer, ObjectPrinter, Serializer, CIRCULAR_MARKER,
};
pub use shipper::{DatadogShipper, ShipperState, DEFAULT_SHUTDOWN_TIMEOUT};
pub use tags::build_tags;
