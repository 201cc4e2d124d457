//! Queue and flush scheduler

use super::{
    backend::{LogHandler, LoggerBackend},
    config::ShipperConfig,
    error::Result,
    filter::ModuleFilter,
    log_record::{Bindings, LogRecord},
    metrics::ShipperMetrics,
    serializer::Serializer,
};
use crate::delivery::{
    DeliveryTarget, DeliveryWorker, FlushHandle, HttpTransport, PayloadContext, Transport,
};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Default time to wait for the final delivery when a shipper is dropped
///
/// For custom timeout control, call `stop()` and wait on the returned
/// [`FlushHandle`] instead.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipperState {
    /// Nothing pending
    Idle,
    /// Records waiting for the next flush
    Accumulating,
}

/// State shared between the shipper, its handlers and the flush timer.
pub(crate) struct ShipperInner {
    pub(crate) config: ShipperConfig,
    pub(crate) filter: ModuleFilter,
    pub(crate) serializer: Serializer,
    queue: Mutex<Vec<LogRecord>>,
    delivery: DeliveryWorker,
    pub(crate) metrics: Arc<ShipperMetrics>,
}

impl ShipperInner {
    pub(crate) fn append(&self, record: LogRecord) {
        let mut queue = self.queue.lock();
        queue.push(record);
        self.metrics.record_queued();

        if self.config.is_immediate() {
            self.drain_locked(&mut queue);
        }
    }

    pub(crate) fn flush(&self) -> FlushHandle {
        let mut queue = self.queue.lock();
        self.drain_locked(&mut queue)
    }

    /// Like `flush`, but the handle also covers batches already in flight.
    fn flush_all(&self) -> FlushHandle {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            return self.delivery.barrier();
        }
        self.drain_locked(&mut queue)
    }

    // Submitting under the queue lock keeps batches in drain order.
    fn drain_locked(&self, queue: &mut Vec<LogRecord>) -> FlushHandle {
        if queue.is_empty() {
            return FlushHandle::completed();
        }

        let batch = std::mem::take(queue);
        self.metrics.record_flush();
        self.delivery.submit(batch)
    }

    fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Periodic flush thread. Holds only a weak reference to the shipper state.
struct FlushTimer {
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FlushTimer {
    fn start(inner: Weak<ShipperInner>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("dd-log-flush".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => match inner.upgrade() {
                        Some(inner) => {
                            inner.flush();
                        }
                        None => break,
                    },
                    // Stop requested or the timer owner is gone
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    fn cancel(mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("Flush timer thread panicked");
            }
        }
    }
}

/// Buffers accepted log records and ships them to the Datadog intake
///
/// Records are flushed every `flush_interval` once [`init`](LoggerBackend::init)
/// has started the timer, or on every record when the interval is zero.
///
/// # Example
///
/// ```no_run
/// use datadog_log_shipper::prelude::*;
///
/// let config = ShipperConfig::builder()
///     .api_key("0123456789abcdef")
///     .env("prod")
///     .build()?;
///
/// let shipper = DatadogShipper::new(config)?;
/// shipper.init()?;
///
/// let bindings = Bindings::new("users", "node-1", "prod").with_service("users");
/// if let Some(handler) = shipper.get_log_handler(bindings) {
///     handler.info(&["user created".into(), 42.into()]);
/// }
///
/// shipper.stop().wait();
/// # Ok::<(), datadog_log_shipper::ShipperError>(())
/// ```
pub struct DatadogShipper {
    inner: Arc<ShipperInner>,
    timer: Mutex<Option<FlushTimer>>,
}

impl DatadogShipper {
    /// Create a shipper sending over HTTP
    ///
    /// # Errors
    ///
    /// Fails with `MissingApiKey` when the configuration has no API key.
    pub fn new(config: ShipperConfig) -> Result<Self> {
        let mut transport = HttpTransport::new();
        if let Some(timeout) = config.request_timeout {
            transport = transport.with_timeout(timeout);
        }
        Self::with_transport(config, Box::new(transport))
    }

    /// Create a shipper from `DATADOG_API_KEY` and default options
    pub fn from_env() -> Result<Self> {
        Self::new(ShipperConfig::builder().build()?)
    }

    /// Create a shipper with a custom transport
    pub fn with_transport(config: ShipperConfig, transport: Box<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(ShipperMetrics::new());
        let target = DeliveryTarget {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            context: PayloadContext::from_config(&config),
        };
        let delivery = DeliveryWorker::spawn(transport, target, Arc::clone(&metrics))?;

        let inner = ShipperInner {
            filter: config.module_filter(),
            serializer: config.serializer(),
            config,
            queue: Mutex::new(Vec::new()),
            delivery,
            metrics,
        };

        Ok(Self {
            inner: Arc::new(inner),
            timer: Mutex::new(None),
        })
    }

    /// Queue an already-built record, bypassing the filter.
    pub fn append(&self, record: LogRecord) {
        self.inner.append(record);
    }

    /// Hand everything pending to delivery and return without waiting.
    ///
    /// A flush of an empty queue sends nothing.
    pub fn flush(&self) -> FlushHandle {
        self.inner.flush()
    }

    /// Records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.inner.pending()
    }

    pub fn state(&self) -> ShipperState {
        if self.pending() == 0 {
            ShipperState::Idle
        } else {
            ShipperState::Accumulating
        }
    }

    /// Whether the flush timer is running
    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    pub fn config(&self) -> &ShipperConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &ShipperMetrics {
        &self.inner.metrics
    }
}

impl LoggerBackend for DatadogShipper {
    fn init(&self) -> Result<()> {
        let interval = self.inner.config.flush_interval;
        let mut timer = self.timer.lock();

        if let Some(previous) = timer.take() {
            previous.cancel();
        }
        if !interval.is_zero() {
            *timer = Some(FlushTimer::start(Arc::downgrade(&self.inner), interval)?);
            debug!("Flushing logs every {:?}", interval);
        }
        Ok(())
    }

    fn get_log_handler(&self, bindings: Bindings) -> Option<LogHandler> {
        let threshold = self.inner.config.levels.level_for(&bindings.module)?;
        Some(LogHandler::new(Arc::clone(&self.inner), bindings, threshold))
    }

    fn stop(&self) -> FlushHandle {
        if let Some(timer) = self.timer.lock().take() {
            timer.cancel();
        }
        self.inner.flush_all()
    }
}

impl Drop for DatadogShipper {
    fn drop(&mut self) {
        if !self.stop().wait_timeout(DEFAULT_SHUTDOWN_TIMEOUT) {
            warn!(
                "Final log delivery did not finish within {:?} timeout",
                DEFAULT_SHUTDOWN_TIMEOUT
            );
        }

        let lost = self.inner.metrics.records_lost();
        if lost > 0 {
            warn!(
                "Log shipper shutting down with {} records lost (failure rate: {:.2}%)",
                lost,
                self.inner.metrics.failure_rate()
            );
        }
    }
}
