//! Upload outcome aggregate

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::domain::aggregates::product::ProductRow;

/// Column marker for errors that concern the header row as a whole.
pub const HEADER_COLUMN: &str = "ALL";

/// A problem located at a sheet row (1-based, header is row 1) and cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: u32,
    pub column: String,
    pub message: String,
}

impl ValidationError {
    pub fn header(message: impl Into<String>) -> Self { Self::header_at(1, message) }

    /// Header-level error for a header row that is not the first sheet row.
    pub fn header_at(row: u32, message: impl Into<String>) -> Self {
        Self { row, column: HEADER_COLUMN.to_string(), message: message.into() }
    }

    pub fn cell(row: u32, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self { row, column: column.into(), message: message.into() }
    }

    pub fn is_header_level(&self) -> bool { self.column == HEADER_COLUMN }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    valid_products: Vec<ProductRow>,
    errors: Vec<ValidationError>,
}

impl UploadResult {
    pub fn new(valid_products: Vec<ProductRow>, errors: Vec<ValidationError>) -> Self {
        Self { valid_products, errors }
    }

    pub fn valid_products(&self) -> &[ProductRow] { &self.valid_products }
    pub fn errors(&self) -> &[ValidationError] { &self.errors }
    pub fn is_clean(&self) -> bool { self.errors.is_empty() }

    /// Number of distinct data rows that produced at least one error.
    pub fn rejected_rows(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| !e.is_header_level())
            .map(|e| e.row)
            .collect::<BTreeSet<_>>()
            .len()
    }
}
