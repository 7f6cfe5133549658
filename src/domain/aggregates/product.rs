//! Product row aggregate
//!
//! A candidate product assembled from one spreadsheet row. Images and attributes
//! are typed; every other canonical path lands in a generic JSON side-map, so the
//! set of importable fields stays driven by the locale mapping tables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use crate::domain::value_objects::FieldPath;

/// Array indices beyond this are treated as a structural conflict.
const MAX_ARRAY_INDEX: usize = 1_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub is_primary: bool,
    pub sort_order: u32,
}

impl ProductImage {
    /// Builds an ordered gallery. Empty URLs are dropped before numbering, so the
    /// first surviving URL is always the primary image.
    pub fn gallery<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .enumerate()
            .map(|(i, url)| Self { url, is_primary: i == 0, sort_order: i as u32 })
            .collect()
    }
}

/// Attribute values are always text; groups come from dotted attribute headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeNode {
    Value(String),
    Group(BTreeMap<String, AttributeNode>),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    #[serde(flatten)]
    fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<ProductImage>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, AttributeNode>,
}

impl ProductRow {
    pub fn new() -> Self { Self::default() }

    pub fn field(&self, path: &str) -> Option<&Value> {
        let path = FieldPath::parse(path);
        let (first, rest) = path.segments().split_first()?;
        rest.iter().try_fold(self.fields.get(first)?, |node, key| match node {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn name(&self) -> Option<&Value> { self.fields.get("name") }
    pub fn images(&self) -> &[ProductImage] { &self.images }
    pub fn attributes(&self) -> &BTreeMap<String, AttributeNode> { &self.attributes }

    /// Leaf attribute value at a dotted sub-path such as `颜色.深浅`.
    pub fn attribute(&self, sub_path: &str) -> Option<&str> {
        let path = FieldPath::parse(sub_path);
        let (leaf, parents) = path.segments().split_last()?;
        let mut level = &self.attributes;
        for key in parents {
            match level.get(key)? {
                AttributeNode::Group(children) => level = children,
                AttributeNode::Value(_) => return None,
            }
        }
        match level.get(leaf)? {
            AttributeNode::Value(v) => Some(v),
            AttributeNode::Group(_) => None,
        }
    }

    /// Writes a generic canonical field. `images` and `attributes` are owned by
    /// their typed branches and cannot be addressed here.
    pub fn set_field(&mut self, path: &FieldPath, value: Value) -> Result<(), PathConflictError> {
        match path.first() {
            Some("images") | Some("attributes") | None => Err(PathConflictError::new(path.to_string())),
            Some(_) => assemble(&mut self.fields, path.segments(), value),
        }
    }

    /// Stores an image gallery. The top-level `images` path fills the typed
    /// gallery; a nested `*.images` path is written as JSON at that location.
    pub fn set_images(&mut self, path: &FieldPath, images: Vec<ProductImage>) -> Result<(), PathConflictError> {
        if path.segments() == ["images"] {
            self.images = images;
            return Ok(());
        }
        let value = serde_json::to_value(images).map_err(|_| PathConflictError::new(path.to_string()))?;
        self.set_field(path, value)
    }

    /// Creates intermediate attribute groups and sets the leaf to `value`.
    pub fn set_attribute(&mut self, sub_path: &[String], value: String) -> Result<(), PathConflictError> {
        let conflict = || PathConflictError::new(format!("attributes.{}", sub_path.join(".")));
        let (leaf, parents) = sub_path.split_last().ok_or_else(conflict)?;
        let mut level = &mut self.attributes;
        for key in parents {
            level = match level.entry(key.clone()).or_insert_with(|| AttributeNode::Group(BTreeMap::new())) {
                AttributeNode::Group(children) => children,
                AttributeNode::Value(_) => return Err(conflict()),
            };
        }
        if matches!(level.get(leaf), Some(AttributeNode::Group(_))) {
            return Err(conflict());
        }
        level.insert(leaf.clone(), AttributeNode::Value(value));
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Writes `value` at `path` inside `record`, creating containers on the way.
/// A numeric next segment creates an array, anything else an object. Walking
/// into a scalar, indexing an object by number, or keying an array by name is
/// a conflict. A failed write leaves `record` untouched.
pub fn assemble(record: &mut Map<String, Value>, path: &[String], value: Value) -> Result<(), PathConflictError> {
    let mut root = Value::Object(record.clone());
    if !write_into(&mut root, path, value) {
        return Err(PathConflictError::new(path.join(".")));
    }
    if let Value::Object(map) = root {
        *record = map;
    }
    Ok(())
}

fn write_into(node: &mut Value, path: &[String], value: Value) -> bool {
    let Some((key, rest)) = path.split_first() else { return false };
    let slot = match node {
        Value::Object(map) => {
            if array_index(key).is_some() {
                return false;
            }
            if rest.is_empty() {
                map.insert(key.clone(), value);
                return true;
            }
            map.entry(key.clone()).or_insert_with(|| empty_container(&rest[0]))
        }
        Value::Array(items) => {
            let Some(idx) = array_index(key) else { return false };
            if items.len() <= idx {
                items.resize(idx + 1, Value::Null);
            }
            if rest.is_empty() {
                items[idx] = value;
                return true;
            }
            let slot = &mut items[idx];
            if slot.is_null() {
                *slot = empty_container(&rest[0]);
            }
            slot
        }
        _ => return false,
    };
    write_into(slot, rest, value)
}

fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<usize>().ok().filter(|i| *i <= MAX_ARRAY_INDEX)
}

fn empty_container(next_segment: &str) -> Value {
    if next_segment.bytes().all(|b| b.is_ascii_digit()) && !next_segment.is_empty() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflictError { pub path: String }

impl PathConflictError {
    pub fn new(path: impl Into<String>) -> Self { Self { path: path.into() } }
}

impl std::error::Error for PathConflictError {}
impl std::fmt::Display for PathConflictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Conflicting structure at `{}`", self.path)
    }
}
