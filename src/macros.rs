//! Logging macros for ergonomic handler calls.
//!
//! Each argument is converted with `LogValue::from`, so strings, numbers,
//! booleans, shared objects and `serde_json::Value`s can be mixed freely.
//!
//! # Examples
//!
//! ```no_run
//! use datadog_log_shipper::prelude::*;
//! use datadog_log_shipper::{dd_error, dd_info};
//!
//! let shipper = DatadogShipper::from_env()?;
//! let handler = shipper
//!     .get_log_handler(Bindings::new("users", "node-1", "prod"))
//!     .expect("users module enabled");
//!
//! dd_info!(handler, "user created", 42);
//! dd_error!(handler, "lookup failed", serde_json::json!({"id": 42}));
//! # Ok::<(), datadog_log_shipper::ShipperError>(())
//! ```

/// Build a `Vec<LogValue>` from heterogeneous arguments.
///
/// # Examples
///
/// ```
/// use datadog_log_shipper::{log_args, LogValue};
///
/// let args = log_args!("retry", 3, true);
/// assert_eq!(args.len(), 3);
/// assert!(matches!(args[1], LogValue::Int(3)));
/// ```
#[macro_export]
macro_rules! log_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::LogValue::from($arg)),*]
    };
}

/// Log through a handler at an explicit level.
#[macro_export]
macro_rules! dd_log {
    ($handler:expr, $level:expr, $($arg:expr),+ $(,)?) => {
        $handler.log($level, &$crate::log_args!($($arg),+))
    };
}

/// Log a trace-level call.
#[macro_export]
macro_rules! dd_trace {
    ($handler:expr, $($arg:expr),+ $(,)?) => {
        $crate::dd_log!($handler, $crate::LogLevel::Trace, $($arg),+)
    };
}

/// Log a debug-level call.
#[macro_export]
macro_rules! dd_debug {
    ($handler:expr, $($arg:expr),+ $(,)?) => {
        $crate::dd_log!($handler, $crate::LogLevel::Debug, $($arg),+)
    };
}

/// Log an info-level call.
#[macro_export]
macro_rules! dd_info {
    ($handler:expr, $($arg:expr),+ $(,)?) => {
        $crate::dd_log!($handler, $crate::LogLevel::Info, $($arg),+)
    };
}

/// Log a warn-level call.
#[macro_export]
macro_rules! dd_warn {
    ($handler:expr, $($arg:expr),+ $(,)?) => {
        $crate::dd_log!($handler, $crate::LogLevel::Warn, $($arg),+)
    };
}

/// Log an error-level call.
#[macro_export]
macro_rules! dd_error {
    ($handler:expr, $($arg:expr),+ $(,)?) => {
        $crate::dd_log!($handler, $crate::LogLevel::Error, $($arg),+)
    };
}

/// Log a fatal-level call.
#[macro_export]
macro_rules! dd_fatal {
    ($handler:expr, $($arg:expr),+ $(,)?) => {
        $crate::dd_log!($handler, $crate::LogLevel::Fatal, $($arg),+)
    };
}
