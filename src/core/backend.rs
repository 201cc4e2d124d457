//! Host logging contract
//!
//! A host logging registry drives a backend through three calls: `init`
//! once, `get_log_handler` per logger it creates, and `stop` on shutdown.

use super::error::Result;
use super::log_level::LogLevel;
use super::log_record::{Bindings, LogRecord};
use super::log_value::LogValue;
use super::shipper::ShipperInner;
use crate::delivery::FlushHandle;
use std::sync::Arc;

/// Capabilities a host logging registry expects from a log backend
pub trait LoggerBackend: Send + Sync {
    /// Start background work (the flush timer)
    fn init(&self) -> Result<()>;

    /// Handler for one set of bindings, or `None` when the module's level
    /// is disabled.
    fn get_log_handler(&self, bindings: Bindings) -> Option<LogHandler>;

    /// Cancel background work and flush what is left.
    ///
    /// The returned handle resolves once this and every earlier batch has
    /// been attempted. Safe to call more than once.
    fn stop(&self) -> FlushHandle;
}

/// Per-logger entry point handed to the host
///
/// Cheap to clone; every clone feeds the same shipper queue.
#[derive(Clone)]
pub struct LogHandler {
    inner: Arc<ShipperInner>,
    bindings: Arc<Bindings>,
    threshold: LogLevel,
}

impl LogHandler {
    pub(crate) fn new(inner: Arc<ShipperInner>, bindings: Bindings, threshold: LogLevel) -> Self {
        Self {
            inner,
            bindings: Arc::new(bindings),
            threshold,
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Level configured for this handler's module
    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Filter, render and queue one log call.
    ///
    /// Never fails and never waits on the network.
    pub fn log(&self, level: LogLevel, args: &[LogValue]) {
        if !self
            .inner
            .filter
            .accept(&self.bindings, level, Some(self.threshold))
        {
            self.inner.metrics.record_filtered();
            return;
        }

        let message = self.inner.serializer.format_message(args);
        self.inner
            .append(LogRecord::new(level, message, Arc::clone(&self.bindings)));
    }

    #[inline]
    pub fn trace(&self, args: &[LogValue]) {
        self.log(LogLevel::Trace, args);
    }

    #[inline]
    pub fn debug(&self, args: &[LogValue]) {
        self.log(LogLevel::Debug, args);
    }

    #[inline]
    pub fn info(&self, args: &[LogValue]) {
        self.log(LogLevel::Info, args);
    }

    #[inline]
    pub fn warn(&self, args: &[LogValue]) {
        self.log(LogLevel::Warn, args);
    }

    #[inline]
    pub fn error(&self, args: &[LogValue]) {
        self.log(LogLevel::Error, args);
    }

    #[inline]
    pub fn fatal(&self, args: &[LogValue]) {
        self.log(LogLevel::Fatal, args);
    }
}

impl std::fmt::Debug for LogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandler")
            .field("bindings", &self.bindings)
            .field("threshold", &self.threshold)
            .finish()
    }
}
