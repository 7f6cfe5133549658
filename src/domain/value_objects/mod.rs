//! Value objects for spreadsheet import

use chrono::{NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A raw cell as decoded from the uploaded sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Absent or empty-string cells. Whitespace is content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Bool(b) => write!(f, "{}", b),
            Self::DateTime(dt) => f.write_str(&iso_timestamp(dt)),
        }
    }
}

impl From<&str> for CellValue { fn from(s: &str) -> Self { Self::Text(s.to_string()) } }
impl From<String> for CellValue { fn from(s: String) -> Self { Self::Text(s) } }
impl From<f64> for CellValue { fn from(n: f64) -> Self { Self::Number(n) } }
impl From<i64> for CellValue { fn from(n: i64) -> Self { Self::Number(n as f64) } }
impl From<bool> for CellValue { fn from(b: bool) -> Self { Self::Bool(b) } }

/// Renders whole numbers without a fractional part, the way a sheet displays them.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-01-05T00:00:00.000Z`.
pub fn iso_timestamp(dt: &NaiveDateTime) -> String {
    dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Type suffix carried by a mapped canonical path (`price:number`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    #[default]
    Auto,
    Number,
    Boolean,
    String,
}

impl DeclaredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DeclaredType {
    type Err = UnknownTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Self::Auto),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "string" => Ok(Self::String),
            other => Err(UnknownTypeError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownTypeError(pub String);
impl std::error::Error for UnknownTypeError {}
impl fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown field type `{}`", self.0) }
}

/// Canonical field path split into segments. Accepts `a.b.0` and `a.b[0]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .replace('[', ".")
            .replace(']', "")
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self(segments)
    }

    pub fn segments(&self) -> &[String] { &self.0 }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn first(&self) -> Option<&str> { self.0.first().map(String::as_str) }
    pub fn leaf(&self) -> Option<&str> { self.0.last().map(String::as_str) }
    pub fn contains(&self, segment: &str) -> bool { self.0.iter().any(|s| s == segment) }
}

impl From<Vec<String>> for FieldPath { fn from(v: Vec<String>) -> Self { Self(v) } }

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0.join(".")) }
}

/// Column letters for a zero-based index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_letter(col_idx: usize) -> String {
    let mut n = col_idx + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Spreadsheet cell reference such as `C3`. `row` is the 1-based sheet row.
pub fn cell_ref(col_idx: usize, row: u32) -> String {
    format!("{}{}", column_letter(col_idx), row)
}
