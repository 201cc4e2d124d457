//! Shipper metrics for observability
//!
//! Counters for records accepted and filtered, and for the outcome of each
//! delivered batch.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for shipper observability
///
/// # Example
///
/// ```
/// use datadog_log_shipper::ShipperMetrics;
///
/// let metrics = ShipperMetrics::new();
///
/// metrics.record_queued();
/// metrics.record_batch_failed(3);
///
/// assert_eq!(metrics.records_queued(), 1);
/// assert_eq!(metrics.records_lost(), 3);
/// ```
#[derive(Debug)]
pub struct ShipperMetrics {
    /// Records that passed the filter and entered the queue
    records_queued: AtomicU64,

    /// Log calls rejected by the filter
    records_filtered: AtomicU64,

    /// Non-empty flushes handed to delivery
    batches_flushed: AtomicU64,

    /// Batches accepted by the intake
    batches_delivered: AtomicU64,

    /// Batches lost to transport errors or rejected status codes
    batches_failed: AtomicU64,

    /// Records inside failed batches
    records_lost: AtomicU64,
}

impl ShipperMetrics {
    pub const fn new() -> Self {
        Self {
            records_queued: AtomicU64::new(0),
            records_filtered: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            records_lost: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn records_queued(&self) -> u64 {
        self.records_queued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_filtered(&self) -> u64 {
        self.records_filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_delivered(&self) -> u64 {
        self.batches_delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_lost(&self) -> u64 {
        self.records_lost.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queued(&self) -> u64 {
        self.records_queued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.records_filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_batch_delivered(&self) -> u64 {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a failed batch of `records` entries
    #[inline]
    pub fn record_batch_failed(&self, records: usize) -> u64 {
        self.records_lost.fetch_add(records as u64, Ordering::Relaxed);
        self.batches_failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of delivery attempts that failed, as a percentage
    ///
    /// Returns 0.0 if nothing has been attempted.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.batches_failed() as f64;
        let total = self.batches_delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for ShipperMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ShipperMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            records_queued: AtomicU64::new(self.records_queued()),
            records_filtered: AtomicU64::new(self.records_filtered()),
            batches_flushed: AtomicU64::new(self.batches_flushed()),
            batches_delivered: AtomicU64::new(self.batches_delivered()),
            batches_failed: AtomicU64::new(self.batches_failed()),
            records_lost: AtomicU64::new(self.records_lost()),
        }
    }
}
