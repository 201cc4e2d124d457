//! Argument rendering for log messages
//!
//! Strings are trimmed, objects and arrays go through an [`ObjectPrinter`],
//! and everything else is stringified as-is. The default printer emits JSON
//! and replaces any object or array seen a second time within the same call
//! with [`CIRCULAR_MARKER`].

use super::log_value::LogValue;
use serde::ser::{Serialize, SerializeMap, SerializeSeq};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;

/// Emitted in place of an object or array that was already printed.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Renders a structured value (object or array) to a single string.
pub type ObjectPrinter = Arc<dyn Fn(&LogValue) -> String + Send + Sync>;

// Largest magnitude below which every whole float is an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Default object printer: JSON with per-call cycle breaking.
///
/// Every call starts with an empty visited set, so repeated calls on the
/// same cyclic value produce the same output.
///
/// # Example
///
/// ```
/// use datadog_log_shipper::core::{json_printer, LogValue, SharedObject};
///
/// let a = SharedObject::new().with_field("name", "a");
/// a.set("self", a.clone());
///
/// let json = json_printer(&LogValue::from(a));
/// assert_eq!(json, r#"{"name":"a","self":"[Circular]"}"#);
/// ```
pub fn json_printer(value: &LogValue) -> String {
    let visited = RefCell::new(HashSet::new());
    // Keys are always strings, so encoding cannot fail.
    serde_json::to_string(&Visit {
        value,
        visited: &visited,
    })
    .unwrap_or_default()
}

/// A value paired with the objects and arrays already printed in this call.
struct Visit<'a> {
    value: &'a LogValue,
    visited: &'a RefCell<HashSet<usize>>,
}

impl Visit<'_> {
    fn first_visit(&self, identity: usize) -> bool {
        self.visited.borrow_mut().insert(identity)
    }
}

impl Serialize for Visit<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.value {
            LogValue::Null => serializer.serialize_unit(),
            LogValue::Bool(b) => serializer.serialize_bool(*b),
            LogValue::Int(i) => serializer.serialize_i64(*i),
            LogValue::Float(f) if is_whole(*f) => serializer.serialize_i64(*f as i64),
            // Non-finite floats come out as null
            LogValue::Float(f) => serializer.serialize_f64(*f),
            LogValue::String(s) => serializer.serialize_str(s),
            LogValue::Object(obj) => {
                if !self.first_visit(obj.identity()) {
                    return serializer.serialize_str(CIRCULAR_MARKER);
                }
                let fields = obj.fields();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, field) in fields.iter() {
                    map.serialize_entry(
                        key,
                        &Visit {
                            value: field,
                            visited: self.visited,
                        },
                    )?;
                }
                map.end()
            }
            LogValue::Array(array) => {
                if !self.first_visit(array.identity()) {
                    return serializer.serialize_str(CIRCULAR_MARKER);
                }
                let items = array.items();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(&Visit {
                        value: item,
                        visited: self.visited,
                    })?;
                }
                seq.end()
            }
        }
    }
}

fn is_whole(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER
}

/// Format a float the way JavaScript's `Number#toString` does.
///
/// Plain notation for exponents in `-7..21`, `1e+21` style outside, and
/// `NaN`/`Infinity` for non-finite values.
pub fn format_number(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }

    // Shortest round-trip digits, e.g. "1.2345e-7"
    let sci = format!("{:e}", f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exp.parse::<i32>().unwrap_or(0) + 1;

    let mut out = String::new();
    if f < 0.0 {
        out.push('-');
    }
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.push_str(&"0".repeat((n - k) as usize));
    } else if 0 < n && n <= 21 {
        out.push_str(&digits[..n as usize]);
        out.push('.');
        out.push_str(&digits[n as usize..]);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-n) as usize));
        out.push_str(&digits);
    } else {
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let e = n - 1;
        let _ = write!(out, "e{}{}", if e < 0 { '-' } else { '+' }, e.abs());
    }
    out
}

/// Turns log call arguments into a single message line.
#[derive(Clone)]
pub struct Serializer {
    printer: ObjectPrinter,
}

impl Serializer {
    /// Create a serializer using the default JSON printer
    pub fn new() -> Self {
        Self {
            printer: Arc::new(json_printer),
        }
    }

    /// Create a serializer with a custom object printer
    pub fn with_printer(printer: ObjectPrinter) -> Self {
        Self { printer }
    }

    /// Render one argument.
    pub fn render(&self, value: &LogValue) -> String {
        match value {
            LogValue::String(s) => s.trim().to_string(),
            LogValue::Object(_) | LogValue::Array(_) => (self.printer)(value),
            other => Self::stringify(other),
        }
    }

    /// Render every argument and join them with single spaces.
    pub fn format_message(&self, args: &[LogValue]) -> String {
        args.iter()
            .map(|arg| self.render(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // Null joins as an empty string.
    fn stringify(value: &LogValue) -> String {
        match value {
            LogValue::Null => String::new(),
            LogValue::Bool(b) => b.to_string(),
            LogValue::Int(i) => i.to_string(),
            LogValue::Float(f) => format_number(*f),
            LogValue::String(s) => s.clone(),
            LogValue::Object(_) | LogValue::Array(_) => json_printer(value),
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Serializer")
    }
}
