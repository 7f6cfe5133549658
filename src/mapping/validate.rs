//! Per-cell validation rules
//!
//! Every rule runs on every cell; a cell can fail several at once.

use crate::domain::aggregates::ValidationError;
use crate::domain::value_objects::DeclaredType;
use crate::mapping::coerce::{parse_image_list, CoercedValue};
use crate::mapping::header::HeaderPath;
use crate::mapping::locale::Messages;

pub const MAX_ATTRIBUTE_LENGTH: usize = 100;

/// Where a cell sits in the sheet; errors are addressed with it.
#[derive(Clone, Copy, Debug)]
pub struct CellLocation<'a> {
    pub row: u32,
    pub cell_ref: &'a str,
}

pub fn validate(
    header: &HeaderPath,
    value: &CoercedValue,
    at: CellLocation<'_>,
    messages: Messages,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_into(header, value, at, messages, &mut errors);
    errors
}

/// Appends the cell's errors to `errors`.
pub fn validate_into(
    header: &HeaderPath,
    value: &CoercedValue,
    at: CellLocation<'_>,
    messages: Messages,
    errors: &mut Vec<ValidationError>,
) {
    let canonical = header.canonical();
    let field = canonical.to_string();
    let mut push = |message: String| errors.push(ValidationError::cell(at.row, at.cell_ref, message));

    if canonical.leaf() == Some("images") && !matches!(header, HeaderPath::Attribute { .. }) {
        let invalid = invalid_image_urls(value);
        if !invalid.is_empty() {
            push(messages.invalid_image_urls(&invalid));
        }
    }

    if let (HeaderPath::Attribute { .. }, CoercedValue::Text(text)) = (header, value) {
        if text.chars().count() > MAX_ATTRIBUTE_LENGTH {
            push(messages.attribute_too_long(&field, MAX_ATTRIBUTE_LENGTH));
        }
    }

    if canonical.contains("name") && value.is_falsy() {
        push(messages.field_required(&field));
    }

    if header.declared_type() == DeclaredType::Number && value.as_number().is_some_and(|n| n < 0.0) {
        push(messages.must_be_positive(&field));
    }
}

fn invalid_image_urls(value: &CoercedValue) -> Vec<String> {
    let urls: Vec<String> = match value {
        CoercedValue::Images(images) => images.iter().map(|i| i.url.clone()).collect(),
        CoercedValue::Text(text) => parse_image_list(text).into_iter().map(|i| i.url).collect(),
        _ => Vec::new(),
    };
    urls.into_iter().filter(|url| !validator::validate_url(url.as_str())).collect()
}
