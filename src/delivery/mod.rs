//! Batch delivery to the logs intake

pub mod payload;
pub mod transport;
pub mod worker;

pub use payload::{encode_batch, PayloadContext, PayloadEntry};
pub use transport::{DeliveryRequest, HttpTransport, Transport, API_KEY_HEADER};
pub use worker::{DeliveryTarget, DeliveryWorker, FlushHandle};
