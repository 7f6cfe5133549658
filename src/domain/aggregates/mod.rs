//! Aggregates module
pub mod product;
pub mod upload;

pub use product::{assemble, AttributeNode, PathConflictError, ProductImage, ProductRow};
pub use upload::{UploadResult, ValidationError, HEADER_COLUMN};
