//! OpenSASE Product Import
//!
//! Spreadsheet bulk upload for the OpenSASE product catalog.
//!
//! ## Features
//! - Localized header rows (`zh`, `en`, configurable) mapped to canonical product fields
//! - Dynamic `属性.*` / `Attributes.*` columns collected into nested attributes
//! - Per-column type coercion (`price:number`, `sku:string`, ...)
//! - Cell-addressed validation errors; failing rows never block the others
//! - Batch submission of valid rows to the product service

pub mod api;
pub mod config;
pub mod domain;
pub mod mapping;
pub mod submit;

use thiserror::Error;

pub use config::{Config, ConfigError};
pub use domain::aggregates::{ProductImage, ProductRow, UploadResult, ValidationError};
pub use domain::value_objects::CellValue;
pub use mapping::SpreadsheetProductMapper;
pub use submit::{BatchCreateResponse, ProductServiceClient, SubmitError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unreadable spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no worksheet")]
    NoWorksheet,

    #[error("Import task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
