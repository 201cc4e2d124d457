//! Loggable argument values
//!
//! Objects and arrays are shared handles, so the same object may appear
//! several times in one argument, including inside itself.

use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::Arc;

/// Value passed as a log call argument
#[derive(Debug, Clone)]
pub enum LogValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(SharedObject),
    Array(SharedArray),
}

impl LogValue {
    /// Objects and arrays go through the object printer.
    #[inline]
    pub fn is_structured(&self) -> bool {
        matches!(self, LogValue::Object(_) | LogValue::Array(_))
    }
}

/// Shared, mutable key/value object. Keys keep insertion order.
#[derive(Clone, Default)]
pub struct SharedObject {
    fields: Arc<RwLock<Vec<(String, LogValue)>>>,
}

impl SharedObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field to the object
    pub fn with_field<K, V>(self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<LogValue>,
    {
        self.set(key, value);
        self
    }

    /// Set a field, replacing an existing value under the same key.
    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<LogValue>,
    {
        let key = key.into();
        let value = value.into();
        let mut fields = self.fields.write();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => fields.push((key, value)),
        }
    }

    /// Read access to the fields.
    ///
    /// Recursive, so a thread already holding a guard on this or a nested
    /// object never waits behind a queued writer.
    pub fn fields(&self) -> RwLockReadGuard<'_, Vec<(String, LogValue)>> {
        self.fields.read_recursive()
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Identity of the underlying allocation
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.fields) as *const () as usize
    }
}

// Debug must not recurse: the object may contain itself.
impl fmt::Debug for SharedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObject")
            .field("fields", &self.len())
            .finish()
    }
}

/// Shared, mutable sequence.
#[derive(Clone, Default)]
pub struct SharedArray {
    items: Arc<RwLock<Vec<LogValue>>>,
}

impl SharedArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item<V: Into<LogValue>>(self, value: V) -> Self {
        self.push(value);
        self
    }

    pub fn push<V: Into<LogValue>>(&self, value: V) {
        self.items.write().push(value.into());
    }

    pub fn items(&self) -> RwLockReadGuard<'_, Vec<LogValue>> {
        self.items.read_recursive()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.items) as *const () as usize
    }
}

impl fmt::Debug for SharedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedArray")
            .field("items", &self.len())
            .finish()
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::String(s)
    }
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::String(s.to_string())
    }
}

impl From<i64> for LogValue {
    fn from(i: i64) -> Self {
        LogValue::Int(i)
    }
}

impl From<i32> for LogValue {
    fn from(i: i32) -> Self {
        LogValue::Int(i as i64)
    }
}

impl From<u32> for LogValue {
    fn from(i: u32) -> Self {
        LogValue::Int(i as i64)
    }
}

impl From<u64> for LogValue {
    fn from(i: u64) -> Self {
        match i64::try_from(i) {
            Ok(i) => LogValue::Int(i),
            Err(_) => LogValue::Float(i as f64),
        }
    }
}

impl From<usize> for LogValue {
    fn from(i: usize) -> Self {
        match i64::try_from(i) {
            Ok(i) => LogValue::Int(i),
            Err(_) => LogValue::Float(i as f64),
        }
    }
}

impl From<f64> for LogValue {
    fn from(f: f64) -> Self {
        LogValue::Float(f)
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

impl From<SharedObject> for LogValue {
    fn from(o: SharedObject) -> Self {
        LogValue::Object(o)
    }
}

impl From<SharedArray> for LogValue {
    fn from(a: SharedArray) -> Self {
        LogValue::Array(a)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(LogValue::Null)
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => LogValue::Null,
            serde_json::Value::Bool(b) => LogValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => LogValue::Int(i),
                None => LogValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => LogValue::String(s),
            serde_json::Value::Array(items) => {
                let array = SharedArray::new();
                for item in items {
                    array.push(item);
                }
                LogValue::Array(array)
            }
            serde_json::Value::Object(map) => {
                let object = SharedObject::new();
                for (k, v) in map {
                    object.set(k, v);
                }
                LogValue::Object(object)
            }
        }
    }
}
