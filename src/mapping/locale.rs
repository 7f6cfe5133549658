//! Per-locale header tables, attribute column patterns and user-facing messages

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::domain::value_objects::{DeclaredType, FieldPath};

/// Locale every lookup falls back to.
pub const FALLBACK_LOCALE: &str = "zh";

const ZH_FIELDS: &[(&str, &str)] = &[
    ("商品名称", "name"),
    ("商品描述", "description"),
    ("商品价格", "price:number"),
    ("库存数量", "stock:number"),
    ("商品编码", "sku:string"),
    ("品牌", "brand"),
    ("分类ID", "category.categoryId"),
    ("分类名称", "category.categoryName"),
    ("图片.链接", "images"),
];
const ZH_ATTRIBUTE_PATTERN: &str = r"^属性\.(.+)$";

const EN_FIELDS: &[(&str, &str)] = &[
    ("Product Name", "name"),
    ("Description", "description"),
    ("Price", "price:number"),
    ("Stock", "stock:number"),
    ("SKU", "sku:string"),
    ("Brand", "brand"),
    ("Category ID", "category.categoryId"),
    ("Category Name", "category.categoryName"),
    ("Image URLs", "images"),
];
const EN_ATTRIBUTE_PATTERN: &str = r"(?i)^attributes?\.(.+)$";

/// A mapped canonical path with its declared type, parsed from `path[:type]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldTarget {
    pub path: FieldPath,
    pub declared: DeclaredType,
}

impl FromStr for FieldTarget {
    type Err = ConfigError;
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (path, declared) = match raw.rsplit_once(':') {
            Some((path, ty)) => (path, ty.parse::<DeclaredType>()?),
            None => (raw, DeclaredType::Auto),
        };
        let path = FieldPath::parse(path);
        if path.is_empty() {
            return Err(ConfigError::InvalidMapping(format!("empty field path in `{}`", raw)));
        }
        Ok(Self { path, declared })
    }
}

/// Localized header → canonical path. Insertion order is kept for templates.
#[derive(Clone, Debug, Default)]
pub struct FieldMapping {
    entries: Vec<(String, FieldTarget)>,
    index: HashMap<String, usize>,
}

impl FieldMapping {
    pub fn from_pairs<I, H, T>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (H, T)>,
        H: AsRef<str>,
        T: AsRef<str>,
    {
        let mut mapping = Self::default();
        for (header, target) in pairs {
            let header = header.as_ref().trim().to_string();
            if mapping.index.contains_key(&header) {
                return Err(ConfigError::InvalidMapping(format!("duplicate header `{}`", header)));
            }
            let target = target.as_ref().parse::<FieldTarget>()?;
            mapping.index.insert(header.clone(), mapping.entries.len());
            mapping.entries.push((header, target));
        }
        Ok(mapping)
    }

    pub fn get(&self, header: &str) -> Option<&FieldTarget> {
        self.index.get(header).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldTarget)> {
        self.entries.iter().map(|(h, t)| (h.as_str(), t))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Recognizes dynamic attribute columns and extracts their dotted sub-path.
#[derive(Clone, Debug)]
pub struct AttributePattern {
    regex: Regex,
    group: usize,
}

impl AttributePattern {
    pub fn new(pattern: &str, group: usize) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern)?;
        if group == 0 || group >= regex.captures_len() {
            return Err(ConfigError::InvalidMapping(format!(
                "pattern `{}` has no capture group {}", pattern, group
            )));
        }
        Ok(Self { regex, group })
    }

    /// The captured sub-path, when the header matches and the group is non-empty.
    pub fn capture<'h>(&self, header: &'h str) -> Option<&'h str> {
        self.regex
            .captures(header)?
            .get(self.group)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn as_str(&self) -> &str { self.regex.as_str() }
}

/// User-facing validation messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Messages {
    Zh,
    En,
}

impl Messages {
    pub fn for_locale(code: &str) -> Self {
        match primary_subtag(code).as_str() {
            "en" => Self::En,
            _ => Self::Zh,
        }
    }

    pub fn field_required(&self, field: &str) -> String {
        match self {
            Self::Zh => format!("{} 为必填项", field),
            Self::En => format!("{} is required", field),
        }
    }

    pub fn must_be_positive(&self, field: &str) -> String {
        match self {
            Self::Zh => format!("{} 必须为正数", field),
            Self::En => format!("{} must be a positive number", field),
        }
    }

    pub fn invalid_image_urls(&self, urls: &[String]) -> String {
        match self {
            Self::Zh => format!("图片链接无效: {}", urls.join(", ")),
            Self::En => format!("Invalid image URL(s): {}", urls.join(", ")),
        }
    }

    pub fn attribute_too_long(&self, field: &str, max: usize) -> String {
        match self {
            Self::Zh => format!("{} 长度不能超过 {} 个字符", field, max),
            Self::En => format!("{} must not exceed {} characters", field, max),
        }
    }

    pub fn unknown_column(&self, header: &str) -> String {
        match self {
            Self::Zh => format!("无法识别的列: {}", header),
            Self::En => format!("Unrecognized column: {}", header),
        }
    }

    pub fn missing_headers(&self, fields: &[&str]) -> String {
        match self {
            Self::Zh => format!("缺少必填列: {}", fields.join(", ")),
            Self::En => format!("Missing required columns: {}", fields.join(", ")),
        }
    }

    pub fn structure_conflict(&self, path: &str) -> String {
        match self {
            Self::Zh => format!("字段结构冲突: {}", path),
            Self::En => format!("Conflicting field structure at {}", path),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LocaleConfig {
    pub code: String,
    pub fields: FieldMapping,
    pub attributes: AttributePattern,
    pub messages: Messages,
}

impl LocaleConfig {
    pub fn new(code: &str, fields: FieldMapping, attributes: AttributePattern) -> Self {
        Self { code: code.to_string(), messages: Messages::for_locale(code), fields, attributes }
    }

    /// Header row a user should place in row 1 for this locale.
    pub fn template_headers(&self) -> Vec<String> {
        let mut seen = Vec::<&FieldPath>::new();
        let mut headers = Vec::new();
        for (header, target) in self.fields.iter() {
            if !seen.contains(&&target.path) {
                seen.push(&target.path);
                headers.push(header.to_string());
            }
        }
        headers
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocaleConfig {
    fields: Map<String, Value>,
    attribute_pattern: String,
    #[serde(default = "default_attribute_group")]
    attribute_group: usize,
}

fn default_attribute_group() -> usize { 1 }

/// All locale tables known to the importer. The fallback locale always exists.
#[derive(Clone, Debug)]
pub struct MappingConfig {
    fallback: LocaleConfig,
    others: HashMap<String, LocaleConfig>,
}

impl MappingConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        let zh = LocaleConfig::new(
            "zh",
            FieldMapping::from_pairs(ZH_FIELDS.iter().copied())?,
            AttributePattern::new(ZH_ATTRIBUTE_PATTERN, 1)?,
        );
        let en = LocaleConfig::new(
            "en",
            FieldMapping::from_pairs(EN_FIELDS.iter().copied())?,
            AttributePattern::new(EN_ATTRIBUTE_PATTERN, 1)?,
        );
        Self::from_locales(vec![zh, en])
    }

    pub fn from_locales(locales: Vec<LocaleConfig>) -> Result<Self, ConfigError> {
        let mut others: HashMap<String, LocaleConfig> =
            locales.into_iter().map(|l| (l.code.clone(), l)).collect();
        let fallback = others.remove(FALLBACK_LOCALE).ok_or(ConfigError::MissingFallbackLocale)?;
        Ok(Self { fallback, others })
    }

    /// Parses a mapping document: `{ "<locale>": { "fields": {..}, "attributePattern": "..", "attributeGroup": 1 } }`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: Map<String, Value> = serde_json::from_str(json)?;
        let mut locales = Vec::with_capacity(raw.len());
        for (code, body) in raw {
            let body: RawLocaleConfig = serde_json::from_value(body)?;
            let mut pairs = Vec::with_capacity(body.fields.len());
            for (header, target) in body.fields {
                let Value::String(target) = target else {
                    return Err(ConfigError::InvalidMapping(format!("`{}` must map to a string path", header)));
                };
                pairs.push((header, target));
            }
            locales.push(LocaleConfig::new(
                &code,
                FieldMapping::from_pairs(pairs)?,
                AttributePattern::new(&body.attribute_pattern, body.attribute_group)?,
            ));
        }
        Self::from_locales(locales)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadMapping { path: path.display().to_string(), source })?;
        Self::from_json(&json)
    }

    /// Exact tag, then primary language subtag, then the fallback locale.
    pub fn locale(&self, tag: &str) -> &LocaleConfig {
        let tag = tag.trim();
        if tag == self.fallback.code {
            return &self.fallback;
        }
        self.others
            .get(tag)
            .or_else(|| self.others.get(&primary_subtag(tag)))
            .unwrap_or_else(|| {
                if primary_subtag(tag) != self.fallback.code {
                    tracing::debug!(locale = %tag, "no mapping for locale, using {}", FALLBACK_LOCALE);
                }
                &self.fallback
            })
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.others.keys().map(String::as_str).collect();
        codes.push(&self.fallback.code);
        codes.sort_unstable();
        codes
    }
}

fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_target_parse() {
        let t: FieldTarget = "price:number".parse().unwrap();
        assert_eq!(t.path.to_string(), "price");
        assert_eq!(t.declared, DeclaredType::Number);
        let t: FieldTarget = "category.categoryId".parse().unwrap();
        assert_eq!(t.declared, DeclaredType::Auto);
        assert!("price:date".parse::<FieldTarget>().is_err());
        assert!(":number".parse::<FieldTarget>().is_err());
    }

    #[test]
    fn test_attribute_pattern() {
        let zh = AttributePattern::new(ZH_ATTRIBUTE_PATTERN, 1).unwrap();
        assert_eq!(zh.capture("属性.颜色.深浅"), Some("颜色.深浅"));
        assert_eq!(zh.capture("属性."), None);
        assert_eq!(zh.capture("图片.链接"), None);
        let en = AttributePattern::new(EN_ATTRIBUTE_PATTERN, 1).unwrap();
        assert_eq!(en.capture("Attributes.Color.Shade"), Some("Color.Shade"));
        assert_eq!(en.capture("attribute.size"), Some("size"));
        assert!(AttributePattern::new("^attr$", 1).is_err());
    }

    #[test]
    fn test_locale_fallback() {
        let config = MappingConfig::builtin().unwrap();
        assert_eq!(config.locale("en").code, "en");
        assert_eq!(config.locale("en-US").code, "en");
        assert_eq!(config.locale("fr").code, "zh");
        assert_eq!(config.locale("").code, "zh");
        assert_eq!(config.codes(), vec!["en", "zh"]);
        assert_eq!(config.locale("en").messages, Messages::En);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "zh": { "fields": { "名称": "name", "价格": "price:number" }, "attributePattern": "^属性\\.(.+)$" },
            "ja": { "fields": { "商品名": "name" }, "attributePattern": "^(属性)\\.(.+)$", "attributeGroup": 2 }
        }"#;
        let config = MappingConfig::from_json(json).unwrap();
        assert_eq!(config.locale("zh").fields.len(), 2);
        assert_eq!(config.locale("ja").attributes.capture("属性.色"), Some("色"));
        assert_eq!(config.locale("zh").template_headers(), vec!["名称", "价格"]);
    }

    #[test]
    fn test_from_json_rejects_bad_config() {
        let no_fallback = r#"{ "en": { "fields": {}, "attributePattern": "^a\\.(.+)$" } }"#;
        assert!(matches!(MappingConfig::from_json(no_fallback), Err(ConfigError::MissingFallbackLocale)));
        let bad_type = r#"{ "zh": { "fields": { "价格": "price:money" }, "attributePattern": "^a\\.(.+)$" } }"#;
        assert!(matches!(MappingConfig::from_json(bad_type), Err(ConfigError::UnknownType(_))));
        let bad_regex = r#"{ "zh": { "fields": {}, "attributePattern": "(" } }"#;
        assert!(matches!(MappingConfig::from_json(bad_regex), Err(ConfigError::Regex(_))));
    }

    #[test]
    fn test_example_mapping_file() {
        let config = MappingConfig::from_json(include_str!("../../config/field-mapping.example.json")).unwrap();
        let published = config.locale("en").fields.get("Published").unwrap();
        assert_eq!(published.declared, DeclaredType::Boolean);
        assert_eq!(config.locale("zh").template_headers().len(), 10);
    }

    #[test]
    fn test_builtin_template() {
        let config = MappingConfig::builtin().unwrap();
        let headers = config.locale("zh").template_headers();
        assert_eq!(headers.first().map(String::as_str), Some("商品名称"));
        assert!(headers.contains(&"图片.链接".to_string()));
    }
}
