//! Header resolution
//!
//! Turns the raw header row into one [`HeaderPath`] per column, in column order.
//! Every row of the upload is matched against this list positionally.

use std::fmt;

use crate::domain::value_objects::{DeclaredType, FieldPath};
use crate::mapping::locale::LocaleConfig;

/// Sentinel prefix for columns that map to nothing.
pub const UNKNOWN_PREFIX: &str = "__UNKNOWN.";

/// Canonical fields that must be present among the resolved headers.
pub const REQUIRED_FIELDS: [&str; 2] = ["name", "price"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderPath {
    /// A mapped canonical field such as `price:number`.
    Field { path: FieldPath, declared: DeclaredType },
    /// A dynamic `attributes.<sub.path>` column.
    Attribute { segments: Vec<String> },
    /// An unrecognized column, kept to report it on every row.
    Unknown { header: String },
}

impl HeaderPath {
    pub fn declared_type(&self) -> DeclaredType {
        match self {
            Self::Field { declared, .. } => *declared,
            _ => DeclaredType::Auto,
        }
    }

    /// The canonical path as the record sees it (`attributes.颜色` for attributes).
    pub fn canonical(&self) -> FieldPath {
        match self {
            Self::Field { path, .. } => path.clone(),
            Self::Attribute { segments } => {
                let mut all = Vec::with_capacity(segments.len() + 1);
                all.push("attributes".to_string());
                all.extend(segments.iter().cloned());
                FieldPath::from(all)
            }
            Self::Unknown { header } => FieldPath::from(vec![format!("{}{}", UNKNOWN_PREFIX, header)]),
        }
    }

    /// Whether the rendered path begins with `prefix`, e.g. `name` or `price`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_string().starts_with(prefix)
    }

    pub fn is_unknown(&self) -> bool { matches!(self, Self::Unknown { .. }) }
}

impl fmt::Display for HeaderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { path, declared: DeclaredType::Auto } => write!(f, "{}", path),
            Self::Field { path, declared } => write!(f, "{}:{}", path, declared),
            Self::Attribute { segments } => write!(f, "attributes.{}", segments.join(".")),
            Self::Unknown { header } => write!(f, "{}{}", UNKNOWN_PREFIX, header),
        }
    }
}

/// Resolves one header: attribute pattern first, then the field table,
/// otherwise the unknown sentinel carrying the original header text.
pub fn resolve_one(raw: &str, locale: &LocaleConfig) -> HeaderPath {
    let header = raw.trim();
    if let Some(sub) = locale.attributes.capture(header) {
        let segments: Vec<String> = FieldPath::parse(sub).segments().to_vec();
        if !segments.is_empty() {
            return HeaderPath::Attribute { segments };
        }
    }
    match locale.fields.get(header) {
        Some(target) => HeaderPath::Field { path: target.path.clone(), declared: target.declared },
        None => HeaderPath::Unknown { header: raw.to_string() },
    }
}

/// One entry per input header, in input order.
pub fn resolve<S: AsRef<str>>(raw_headers: &[S], locale: &LocaleConfig) -> Vec<HeaderPath> {
    raw_headers.iter().map(|h| resolve_one(h.as_ref(), locale)).collect()
}

/// Required canonical fields with no resolved column.
pub fn missing_required(headers: &[HeaderPath]) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !headers.iter().any(|h| h.starts_with(field)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::locale::MappingConfig;

    #[test]
    fn test_every_mapped_header_round_trips() {
        let config = MappingConfig::builtin().unwrap();
        for code in ["zh", "en"] {
            let locale = config.locale(code);
            for (header, target) in locale.fields.iter() {
                let resolved = resolve(&[header], locale);
                assert_eq!(resolved.len(), 1);
                assert_eq!(resolved[0], HeaderPath::Field { path: target.path.clone(), declared: target.declared });
            }
        }
    }

    #[test]
    fn test_resolution_order_and_kinds() {
        let config = MappingConfig::builtin().unwrap();
        let zh = config.locale("zh");
        let resolved = resolve(&[" 商品名称 ", "属性.颜色", "商品价格", "备注"], zh);
        assert_eq!(resolved.iter().map(|h| h.to_string()).collect::<Vec<_>>(), vec![
            "name", "attributes.颜色", "price:number", "__UNKNOWN.备注",
        ]);
        assert_eq!(resolved[2].declared_type(), DeclaredType::Number);
        assert!(resolved[3].is_unknown());
    }

    #[test]
    fn test_unknown_locale_uses_zh_tables() {
        let config = MappingConfig::builtin().unwrap();
        let resolved = resolve(&["商品名称", "Product Name"], config.locale("de"));
        assert_eq!(resolved[0].to_string(), "name");
        assert!(resolved[1].is_unknown());
    }

    #[test]
    fn test_english_attributes() {
        let config = MappingConfig::builtin().unwrap();
        let resolved = resolve(&["Attributes.Color.Shade"], config.locale("en"));
        assert_eq!(resolved[0], HeaderPath::Attribute { segments: vec!["Color".into(), "Shade".into()] });
        assert_eq!(resolved[0].canonical().to_string(), "attributes.Color.Shade");
    }

    #[test]
    fn test_missing_required() {
        let config = MappingConfig::builtin().unwrap();
        let zh = config.locale("zh");
        assert_eq!(missing_required(&resolve(&["商品描述"], zh)), vec!["name", "price"]);
        assert_eq!(missing_required(&resolve(&["商品名称"], zh)), vec!["price"]);
        assert!(missing_required(&resolve(&["商品名称", "商品价格"], zh)).is_empty());
    }
}
