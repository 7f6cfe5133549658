//! Spreadsheet → product mapping
//!
//! Header row in, validated product records and cell-addressed errors out.
//! Each data row is built independently; a row with any error is dropped whole.

pub mod coerce;
pub mod header;
pub mod locale;
pub mod validate;
pub mod workbook;

use crate::config::ConfigError;
use crate::domain::aggregates::{PathConflictError, ProductRow, UploadResult, ValidationError};
use crate::domain::value_objects::{cell_ref, CellValue};

pub use coerce::{coerce, CoercedValue};
pub use header::{missing_required, resolve, HeaderPath};
pub use locale::{AttributePattern, FieldMapping, LocaleConfig, MappingConfig, Messages};
pub use validate::{validate, CellLocation};
pub use workbook::{read_first_sheet, Sheet, SheetOrigin};

#[derive(Clone, Debug)]
pub struct SpreadsheetProductMapper {
    config: MappingConfig,
}

impl SpreadsheetProductMapper {
    pub fn new(config: MappingConfig) -> Self { Self { config } }

    pub fn builtin() -> Result<Self, ConfigError> { Ok(Self::new(MappingConfig::builtin()?)) }

    pub fn config(&self) -> &MappingConfig { &self.config }

    pub fn resolve_headers<S: AsRef<str>>(&self, raw_headers: &[S], locale: &str) -> Vec<HeaderPath> {
        resolve(raw_headers, self.config.locale(locale))
    }

    /// Decodes the first worksheet and maps it. Only an unreadable file fails.
    pub fn parse_bytes(&self, bytes: &[u8], locale: &str) -> crate::Result<UploadResult> {
        let sheet = read_first_sheet(bytes)?;
        Ok(self.process_sheet(&sheet, locale))
    }

    pub fn process_sheet(&self, sheet: &Sheet, locale: &str) -> UploadResult {
        let headers = self.resolve_headers(&sheet.headers(), locale);
        self.process_rows_at(sheet.data_rows(), &headers, locale, sheet.origin)
    }

    /// Maps rows of a table whose header sits in A1.
    pub fn process_rows(&self, data_rows: &[Vec<CellValue>], headers: &[HeaderPath], locale: &str) -> UploadResult {
        self.process_rows_at(data_rows, headers, locale, SheetOrigin::default())
    }

    /// Maps rows of a table whose header starts at `origin`; error rows and cell
    /// references are reported in sheet coordinates.
    pub fn process_rows_at(
        &self,
        data_rows: &[Vec<CellValue>],
        headers: &[HeaderPath],
        locale: &str,
        origin: SheetOrigin,
    ) -> UploadResult {
        let messages = self.config.locale(locale).messages;
        let mut errors = Vec::new();

        for unknown in headers.iter().filter(|h| h.is_unknown()) {
            tracing::warn!(header = %unknown, "unrecognized column");
        }
        // Reported, but rows are still processed so every problem surfaces at once.
        let missing = missing_required(headers);
        if !missing.is_empty() {
            tracing::warn!(?missing, "required columns missing from header row");
            errors.push(ValidationError::header_at(origin.header_row(), messages.missing_headers(&missing)));
        }

        let mut valid_products = Vec::new();
        for (n, cells) in data_rows.iter().enumerate() {
            let row = origin.data_row(n);
            match build_row(cells, headers, row, origin.col, messages) {
                Ok(product) => valid_products.push(product),
                Err(row_errors) => errors.extend(row_errors),
            }
        }

        let result = UploadResult::new(valid_products, errors);
        tracing::info!(
            rows = data_rows.len(),
            valid = result.valid_products().len(),
            rejected = result.rejected_rows(),
            errors = result.errors().len(),
            "bulk upload mapped"
        );
        result
    }
}

fn build_row(
    cells: &[CellValue],
    headers: &[HeaderPath],
    row: u32,
    first_col: usize,
    messages: Messages,
) -> Result<ProductRow, Vec<ValidationError>> {
    let empty = CellValue::Empty;
    let mut product = ProductRow::new();
    let mut errors = Vec::new();

    for (col, header) in headers.iter().enumerate() {
        let raw = cells.get(col).unwrap_or(&empty);
        let cell = cell_ref(first_col + col, row);
        if let HeaderPath::Unknown { header } = header {
            errors.push(ValidationError::cell(row, cell, messages.unknown_column(header)));
            continue;
        }
        let at = CellLocation { row, cell_ref: &cell };
        if let Err(conflict) = apply_cell(&mut product, header, raw, at, messages, &mut errors) {
            errors.push(ValidationError::cell(row, cell.as_str(), messages.structure_conflict(&conflict.path)));
        }
    }

    if errors.is_empty() { Ok(product) } else { Err(errors) }
}

/// Coerces, validates and writes one cell. Attributes, then images, then generic paths.
fn apply_cell(
    product: &mut ProductRow,
    header: &HeaderPath,
    raw: &CellValue,
    at: CellLocation<'_>,
    messages: Messages,
    errors: &mut Vec<ValidationError>,
) -> Result<(), PathConflictError> {
    let canonical = header.canonical();
    let value = coerce(raw, header.declared_type(), &canonical);
    validate::validate_into(header, &value, at, messages, errors);

    match (header, value) {
        (_, CoercedValue::Null) => Ok(()),
        (HeaderPath::Attribute { segments }, CoercedValue::Text(text)) => product.set_attribute(segments, text),
        (_, CoercedValue::Images(images)) => product.set_images(&canonical, images),
        (_, value) => product.set_field(&canonical, value.to_json()),
    }
}
