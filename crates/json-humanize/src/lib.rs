//! Human-readable rendering of monitor JSON documents.
//!
//! The monitor endpoints serialize their records as indented JSON. This crate
//! rewrites selected fields of such a document for people reading it in a
//! terminal:
//!
//! - `*_at` fields holding a 19-digit nanosecond epoch become RFC 3339 strings
//! - `*_bytes` fields become base-1000 sizes such as `"1.5 MB"`
//! - `cpu` and `memory` are rounded to one decimal place and stay numeric;
//!   whole values keep their `.0` (`34.0`)
//!
//! The rewrite walks the parsed value tree, so it does not depend on how the
//! document was laid out. At most one rule applies to a field; a field that
//! matches no rule, or whose value cannot be rendered, is kept as it was.
//!
//! # Example
//!
//! ```
//! let raw = br#"{ "sent_bytes": 1500000, "cpu": 33.27 }"#;
//! let readable = json_humanize::humanize(raw).unwrap();
//!
//! assert!(readable.contains(r#""sent_bytes": "1.5 MB""#));
//! assert!(readable.contains(r#""cpu": 33.3"#));
//! ```

mod format;

pub use format::{format_bytes, format_percentage, format_timestamp_nanos, round_percentage};

use serde_json::{Number, Value};
use thiserror::Error;
use tracing::warn;

/// Smallest and largest values with exactly 19 decimal digits.
const NANOS_MIN: u64 = 1_000_000_000_000_000_000;
const NANOS_MAX: u64 = 9_999_999_999_999_999_999;

/// Errors raised while rewriting a document.
#[derive(Debug, Error)]
pub enum HumanizeError {
    #[error("input is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize rewritten document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Rewrite a serialized JSON document into its human-readable form.
///
/// The result is re-serialized with two-space indentation.
pub fn humanize(input: &[u8]) -> Result<String, HumanizeError> {
    let mut value: Value = serde_json::from_slice(input).map_err(HumanizeError::Parse)?;
    humanize_value(&mut value);
    serde_json::to_string_pretty(&value).map_err(HumanizeError::Serialize)
}

/// Like [`humanize`], but hands back the input untouched when it cannot be
/// rewritten.
pub fn humanize_or_raw(input: &[u8]) -> String {
    match humanize(input) {
        Ok(readable) => readable,
        Err(e) => {
            warn!(error = %e, "Returning document without human-readable rendering");
            String::from_utf8_lossy(input).into_owned()
        }
    }
}

/// Rewrite every matching field of `value` in place, at any depth.
pub fn humanize_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                match render_field(key, field) {
                    Some(rendered) => *field = rendered,
                    None => humanize_value(field),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(humanize_value),
        _ => {}
    }
}

/// Apply the first matching rule for `key`, if any.
fn render_field(key: &str, value: &Value) -> Option<Value> {
    if key.ends_with("_at")
        && let Some(nanos) = epoch_nanos(value)
    {
        return Some(Value::String(format_timestamp_nanos(nanos)));
    }

    if key.ends_with("_bytes")
        && let Some(bytes) = value.as_u64()
    {
        return Some(Value::String(format_bytes(bytes)));
    }

    if matches!(key, "cpu" | "memory") {
        let usage = value.as_f64().filter(|v| v.is_finite() && *v >= 0.0)?;
        return format_percentage(usage)
            .parse::<Number>()
            .ok()
            .map(Value::Number);
    }

    None
}

/// A non-negative integer of exactly 19 digits that fits a nanosecond epoch.
fn epoch_nanos(value: &Value) -> Option<i64> {
    let raw = value.as_u64().filter(|n| (NANOS_MIN..=NANOS_MAX).contains(n))?;
    i64::try_from(raw).ok()
}
