//! The composite type model: `APIType` and its facet groups.
//!
//! An `APIType` is a `TypeDeclaration` plus one facet group per kind of
//! type. Which groups are meaningful depends on the (resolved) native type;
//! inheritance copies whole groups from the base type (see `merge`).
use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotations;
use crate::example::{Example, Examples};
use crate::value::Value;

/// Default ceiling for `maxItems` / `maxLength`; omitted from output.
pub const DEFAULT_MAX: i64 = 2147483647;

/// A name that refers to a declared or built-in type (optionally qualified by
/// a library namespace, optionally an array). Anything else is inline.
static TYPE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w-]+(\.[\w-]+)*(\[\])?$").expect("valid regex"));

// ————————————————————————————————————————————————————————————————————————————
// OPAQUE FRAGMENTS
// ————————————————————————————————————————————————————————————————————————————

/// A RAML section that is carried through but never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Raw(pub serde_json::Value);

impl Raw {
    pub fn from_yaml(node: &serde_yaml::Value) -> crate::error::Result<Raw> {
        Ok(Raw(Value::from_yaml(node)?.to_json()))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NATIVE TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum NativeType {
    Boolean,
    Integer,
    Number,
    String,
    Object,
    Array,
    File,
    Nil,
    DateTime,
    #[default]
    Any,
    /// A declared type that has not (yet) been resolved to a built-in.
    Custom(String),
}

impl NativeType {
    pub fn from_name(name: &str) -> NativeType {
        match name {
            "boolean" => NativeType::Boolean,
            "integer" => NativeType::Integer,
            "number" => NativeType::Number,
            "string" => NativeType::String,
            "object" => NativeType::Object,
            "array" => NativeType::Array,
            "file" => NativeType::File,
            "nil" => NativeType::Nil,
            "date-only" | "time-only" | "datetime-only" | "datetime" => NativeType::DateTime,
            "" | "any" => NativeType::Any,
            other => NativeType::Custom(other.to_string()),
        }
    }
    pub fn is_builtin_name(name: &str) -> bool {
        !matches!(NativeType::from_name(name), NativeType::Custom(_))
    }
    pub fn is_any(&self) -> bool {
        matches!(self, NativeType::Any)
    }
    pub fn as_str(&self) -> &str {
        match self {
            NativeType::Boolean => "boolean",
            NativeType::Integer => "integer",
            NativeType::Number => "number",
            NativeType::String => "string",
            NativeType::Object => "object",
            NativeType::Array => "array",
            NativeType::File => "file",
            NativeType::Nil => "nil",
            NativeType::DateTime => "datetime",
            NativeType::Any => "any",
            NativeType::Custom(name) => name,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NativeType> for String {
    fn from(value: NativeType) -> Self {
        value.as_str().to_string()
    }
}

impl From<String> for NativeType {
    fn from(value: String) -> Self {
        NativeType::from_name(&value)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECLARATION & FACET GROUPS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeDeclaration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Raw>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Raw>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Example>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: Examples,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Raw>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<Raw>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectType {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "is_true")]
    pub additional_properties: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<Raw>,
}

impl Default for ObjectType {
    fn default() -> Self {
        Self {
            properties: Properties::new(),
            min_properties: None,
            max_properties: None,
            additional_properties: true,
            discriminator: None,
            discriminator_value: None,
        }
    }
}

impl ObjectType {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.additional_properties
            && self.discriminator.is_none()
            && self.discriminator_value.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarType {
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<Value>,
}

impl ScalarType {
    pub fn is_empty(&self) -> bool {
        self.enumeration.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringFacets {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pattern: String,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub min_length: i64,
    #[serde(skip_serializing_if = "is_default_max")]
    pub max_length: i64,
}

impl Default for StringFacets {
    fn default() -> Self {
        Self { pattern: String::new(), min_length: 0, max_length: DEFAULT_MAX }
    }
}

impl StringFacets {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty() && self.min_length == 0 && self.max_length == DEFAULT_MAX
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrayType {
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Raw>,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub min_items: i64,
    #[serde(skip_serializing_if = "is_default_max")]
    pub max_items: i64,
}

impl Default for ArrayType {
    fn default() -> Self {
        Self { unique_items: false, items: None, min_items: 0, max_items: DEFAULT_MAX }
    }
}

impl ArrayType {
    pub fn is_empty(&self) -> bool {
        !self.unique_items && self.items.is_none() && self.min_items == 0 && self.max_items == DEFAULT_MAX
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileType {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub min_length: i64,
    #[serde(skip_serializing_if = "is_default_max")]
    pub max_length: i64,
}

impl Default for FileType {
    fn default() -> Self {
        Self { file_types: Vec::new(), min_length: 0, max_length: DEFAULT_MAX }
    }
}

impl FileType {
    pub fn is_empty(&self) -> bool {
        self.file_types.is_empty() && self.min_length == 0 && self.max_length == DEFAULT_MAX
    }
}

// ————————————————————————————————————————————————————————————————————————————
// API TYPE
// ————————————————————————————————————————————————————————————————————————————

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct APIType {
    #[serde(flatten)]
    pub declaration: TypeDeclaration,
    #[serde(flatten)]
    pub object: ObjectType,
    #[serde(flatten)]
    pub scalar: ScalarType,
    #[serde(flatten)]
    pub string: StringFacets,
    #[serde(flatten)]
    pub array: ArrayType,
    #[serde(flatten)]
    pub file: FileType,
    /// Type name without a trailing `[]`.
    #[serde(skip)]
    pub base_type: String,
    #[serde(skip)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "NativeType::is_any")]
    pub native_type: NativeType,
    /// Set once inheritance has been filled.
    #[serde(skip)]
    pub resolved: bool,
}

/// Outgoing shape of an `APIType`. The string and file groups share the
/// length keys, so only the group owning them for the native type is written.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct APITypeOut<'a> {
    #[serde(flatten)]
    declaration: &'a TypeDeclaration,
    #[serde(flatten)]
    object: &'a ObjectType,
    #[serde(flatten)]
    scalar: &'a ScalarType,
    #[serde(skip_serializing_if = "str_is_empty")]
    pattern: &'a str,
    #[serde(flatten)]
    array: &'a ArrayType,
    #[serde(skip_serializing_if = "slice_is_empty")]
    file_types: &'a [String],
    #[serde(skip_serializing_if = "is_zero_i64")]
    min_length: i64,
    #[serde(skip_serializing_if = "is_default_max")]
    max_length: i64,
    #[serde(skip_serializing_if = "native_is_any")]
    native_type: &'a NativeType,
}

impl Serialize for APIType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (min_length, max_length) = match self.native_type {
            NativeType::File => (self.file.min_length, self.file.max_length),
            _ => (self.string.min_length, self.string.max_length),
        };
        APITypeOut {
            declaration: &self.declaration,
            object: &self.object,
            scalar: &self.scalar,
            pattern: &self.string.pattern,
            array: &self.array,
            file_types: &self.file.file_types,
            min_length,
            max_length,
            native_type: &self.native_type,
        }
        .serialize(serializer)
    }
}

impl APIType {
    pub fn with_type(name: impl Into<String>) -> Self {
        let mut api_type = APIType::default();
        api_type.set_type(name);
        api_type
    }

    /// Set the declared type name and recompute the derived fields.
    pub fn set_type(&mut self, name: impl Into<String>) {
        self.declaration.type_name = name.into();
        self.refresh_derived();
    }

    pub(crate) fn refresh_derived(&mut self) {
        let name = &self.declaration.type_name;
        match name.strip_suffix("[]") {
            Some(base) => {
                self.base_type = base.to_string();
                self.is_array = true;
            }
            None => {
                self.base_type = name.clone();
                self.is_array = false;
            }
        }
        self.native_type = NativeType::from_name(&self.base_type);
    }

    pub fn type_name(&self) -> &str {
        &self.declaration.type_name
    }

    /// Declared as a structural literal (or not at all) rather than by name.
    pub fn is_inline(&self) -> bool {
        !TYPE_REFERENCE.is_match(&self.declaration.type_name)
    }

    /// Whether `base_type` must be looked up in a types table.
    pub fn needs_lookup(&self) -> bool {
        !self.is_inline() && !NativeType::is_builtin_name(&self.base_type)
    }

    pub fn properties(&self) -> &Properties {
        &self.object.properties
    }

    pub fn examples_iter(&self) -> impl Iterator<Item = &Example> {
        self.declaration.example.iter().chain(self.declaration.examples.values())
    }

    pub fn examples_iter_mut(&mut self) -> impl Iterator<Item = &mut Example> {
        self.declaration.example.iter_mut().chain(self.declaration.examples.values_mut())
    }

    pub fn has_examples(&self) -> bool {
        self.declaration.example.is_some() || !self.declaration.examples.is_empty()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PROPERTIES
// ————————————————————————————————————————————————————————————————————————————

pub type Properties = IndexMap<String, Property>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(flatten)]
    pub api_type: APIType,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub required: bool,
    #[serde(skip)]
    pub name: String,
}

impl Default for Property {
    fn default() -> Self {
        Self { api_type: APIType::default(), required: true, name: String::new() }
    }
}

impl Property {
    pub fn new(name: impl Into<String>, type_name: &str) -> Self {
        Self { api_type: APIType::with_type(type_name), required: true, name: name.into() }
    }
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Normalize `name?` keys into `required: false` properties named `name`.
/// Declaration order is kept; running it again changes nothing.
pub fn fix_required_by_syntax(properties: &mut Properties) -> crate::error::Result<()> {
    if !properties.keys().any(|name| name.ends_with('?')) {
        for (name, property) in properties.iter_mut() {
            property.name.clone_from(name);
        }
        return Ok(());
    }
    let mut normalized = Properties::with_capacity(properties.len());
    for (name, mut property) in std::mem::take(properties) {
        let name = match name.strip_suffix('?') {
            Some(trimmed) => {
                property.required = false;
                trimmed.to_string()
            }
            None => name,
        };
        if normalized.contains_key(&name) {
            return Err(crate::error::Error::DuplicateProperty { name });
        }
        property.name.clone_from(&name);
        normalized.insert(name, property);
    }
    *properties = normalized;
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn default_true() -> bool {
    true
}
pub(crate) fn is_true(value: &bool) -> bool {
    *value
}
pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}
fn is_default_max(value: &i64) -> bool {
    *value == DEFAULT_MAX
}
fn str_is_empty(value: &&str) -> bool {
    value.is_empty()
}
fn slice_is_empty(value: &&[String]) -> bool {
    value.is_empty()
}
fn native_is_any(value: &&NativeType) -> bool {
    value.is_any()
}
