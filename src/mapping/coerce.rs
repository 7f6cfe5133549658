//! Cell value coercion

use serde_json::Value;

use crate::domain::aggregates::ProductImage;
use crate::domain::value_objects::{iso_timestamp, CellValue, DeclaredType, FieldPath};

/// A cell after coercion, before it is written into a record.
#[derive(Clone, Debug, PartialEq)]
pub enum CoercedValue {
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
    Images(Vec<ProductImage>),
}

impl CoercedValue {
    /// Falsy in the sense the required-field rule uses: null, zero, NaN, false, "".
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(n) => *n == 0.0 || n.is_nan(),
            Self::Bool(b) => !b,
            Self::Text(s) => s.is_empty(),
            Self::Images(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Number(n) => number_value(*n),
            Self::Bool(b) => Value::Bool(*b),
            Self::Text(s) => Value::String(s.clone()),
            Self::Images(images) => serde_json::to_value(images).unwrap_or(Value::Null),
        }
    }
}

/// Whole numbers serialize as JSON integers so `10` stays `10`.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

pub fn coerce(raw: &CellValue, declared: DeclaredType, path: &FieldPath) -> CoercedValue {
    if raw.is_empty() {
        return CoercedValue::Null;
    }
    if path.first() == Some("attributes") {
        return CoercedValue::Text(raw.to_string());
    }
    if path.leaf() == Some("images") {
        return CoercedValue::Images(parse_image_list(&raw.to_string()));
    }
    match declared {
        DeclaredType::Auto => coerce_auto(raw),
        DeclaredType::Number => CoercedValue::Number(to_number(raw)),
        DeclaredType::Boolean => CoercedValue::Bool(to_bool(raw)),
        DeclaredType::String => CoercedValue::Text(raw.to_string()),
    }
}

/// Comma-separated URLs, optionally wrapped in `[...]` or backticks.
pub fn parse_image_list(raw: &str) -> Vec<ProductImage> {
    let cleaned: String = raw.trim().chars().filter(|c| !matches!(c, '[' | ']' | '`')).collect();
    ProductImage::gallery(cleaned.split(','))
}

fn coerce_auto(raw: &CellValue) -> CoercedValue {
    match raw {
        CellValue::Empty => CoercedValue::Null,
        CellValue::Number(n) => CoercedValue::Number(*n),
        CellValue::Bool(b) => CoercedValue::Bool(*b),
        CellValue::DateTime(dt) => CoercedValue::Text(iso_timestamp(dt)),
        // Any non-digit keeps the text as typed, so "¥99" or "99.5" stay strings.
        CellValue::Text(s) if s.chars().any(|c| !c.is_ascii_digit()) => CoercedValue::Text(s.clone()),
        CellValue::Text(s) => match s.parse::<f64>() {
            Ok(n) => CoercedValue::Number(n),
            Err(_) => match s.to_ascii_lowercase().as_str() {
                "true" => CoercedValue::Bool(true),
                "false" => CoercedValue::Bool(false),
                _ => CoercedValue::Text(s.clone()),
            },
        },
    }
}

/// Non-numeric input becomes `0`.
fn to_number(raw: &CellValue) -> f64 {
    let n = match raw {
        CellValue::Empty => 0.0,
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => if *b { 1.0 } else { 0.0 },
        CellValue::DateTime(dt) => dt.and_utc().timestamp_millis() as f64,
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() { 0.0 } else { s.parse::<f64>().unwrap_or(0.0) }
        }
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Text `"false"` and `"0"` (any case) are false; other non-empty text is true.
fn to_bool(raw: &CellValue) -> bool {
    match raw {
        CellValue::Empty => false,
        CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
        CellValue::Bool(b) => *b,
        CellValue::DateTime(_) => true,
        CellValue::Text(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            let falsy = lowered == "false" || lowered == "0";
            if falsy {
                tracing::debug!(value = %s, "boolean text literal coerced to false");
            }
            !falsy
        }
    }
}
