//! Detached delivery thread
//!
//! Flushed batches are queued to a single background thread, which encodes
//! and sends them one at a time in submission order. Callers get a
//! [`FlushHandle`] back immediately and may ignore it.

use super::payload::{encode_batch, PayloadContext};
use super::transport::{DeliveryRequest, Transport};
use crate::core::{LogRecord, Result, ShipperMetrics, DEFAULT_SHUTDOWN_TIMEOUT};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::cell::Cell;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Where and how batches are sent.
#[derive(Debug, Clone)]
pub struct DeliveryTarget {
    pub url: String,
    pub api_key: String,
    pub context: PayloadContext,
}

struct DeliveryJob {
    batch: Vec<LogRecord>,
    done: Sender<()>,
}

/// Completion signal for one flush
///
/// Resolves once the delivery attempt for the flushed batch finished,
/// successfully or not. A flush of an empty queue is complete immediately.
pub struct FlushHandle {
    done: Option<Receiver<()>>,
    finished: Cell<bool>,
}

impl FlushHandle {
    pub(crate) fn completed() -> Self {
        Self {
            done: None,
            finished: Cell::new(true),
        }
    }

    fn pending(done: Receiver<()>) -> Self {
        Self {
            done: Some(done),
            finished: Cell::new(false),
        }
    }

    /// Whether the delivery attempt has finished, without blocking
    pub fn is_complete(&self) -> bool {
        if self.finished.get() {
            return true;
        }
        let Some(done) = &self.done else {
            return true;
        };
        match done.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                self.finished.set(true);
                true
            }
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Block until the delivery attempt has finished
    pub fn wait(self) {
        if self.is_complete() {
            return;
        }
        if let Some(done) = &self.done {
            let _ = done.recv();
        }
    }

    /// Block for at most `timeout`; `true` if the attempt finished in time
    pub fn wait_timeout(self, timeout: Duration) -> bool {
        if self.is_complete() {
            return true;
        }
        match &self.done {
            Some(done) => !matches!(done.recv_timeout(timeout), Err(RecvTimeoutError::Timeout)),
            None => true,
        }
    }
}

impl std::fmt::Debug for FlushHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Owner of the delivery thread
pub struct DeliveryWorker {
    sender: Option<Sender<DeliveryJob>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DeliveryWorker {
    /// Start the delivery thread
    ///
    /// # Errors
    ///
    /// Returns an IO error if the thread cannot be spawned.
    pub fn spawn(
        transport: Box<dyn Transport>,
        target: DeliveryTarget,
        metrics: Arc<ShipperMetrics>,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded::<DeliveryJob>();

        let handle = thread::Builder::new()
            .name("dd-log-delivery".to_string())
            .spawn(move || {
                // Exits once every sender is gone and the queue is drained.
                for job in receiver.iter() {
                    if !job.batch.is_empty() {
                        deliver(transport.as_ref(), &target, &metrics, job.batch);
                    }
                    let _ = job.done.send(());
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Handle that resolves once every batch submitted so far was attempted.
    ///
    /// Sends nothing to the transport.
    pub fn barrier(&self) -> FlushHandle {
        self.submit(Vec::new())
    }

    /// Queue a batch for delivery and return without waiting.
    pub fn submit(&self, batch: Vec<LogRecord>) -> FlushHandle {
        let Some(sender) = &self.sender else {
            return FlushHandle::completed();
        };

        let (done_tx, done_rx) = bounded(1);
        match sender.send(DeliveryJob {
            batch,
            done: done_tx,
        }) {
            Ok(()) => FlushHandle::pending(done_rx),
            Err(_) => {
                error!("Delivery thread is gone, dropping batch");
                FlushHandle::completed()
            }
        }
    }
}

impl Drop for DeliveryWorker {
    fn drop(&mut self) {
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        error!("Delivery thread panicked during shutdown");
                    }
                    break;
                }
                if start.elapsed() >= DEFAULT_SHUTDOWN_TIMEOUT {
                    warn!(
                        "Delivery thread did not finish within {:?}, pending batches may be lost",
                        DEFAULT_SHUTDOWN_TIMEOUT
                    );
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

/// One attempt, no retry. Failures are logged and the batch is dropped.
fn deliver(
    transport: &dyn Transport,
    target: &DeliveryTarget,
    metrics: &ShipperMetrics,
    batch: Vec<LogRecord>,
) {
    let records = batch.len();
    let body = match encode_batch(&batch, &target.context) {
        Ok(body) => body,
        Err(e) => {
            warn!("Unable to encode log batch. Error: {}", e);
            metrics.record_batch_failed(records);
            return;
        }
    };
    drop(batch);

    let request = DeliveryRequest {
        url: target.url.clone(),
        api_key: target.api_key.clone(),
        body,
        records,
    };

    // A panicking transport must not take the delivery thread down with it.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| transport.send(request)));

    match result {
        Ok(Ok(())) => {
            debug!("Uploaded {} log entries via {}", records, transport.name());
            metrics.record_batch_delivered();
        }
        Ok(Err(e)) => {
            warn!("Unable to upload logs to Datadog server. Error: {}", e);
            metrics.record_batch_failed(records);
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Transport '{}' panicked: {}", transport.name(), panic_msg);
            metrics.record_batch_failed(records);
        }
    }
}
