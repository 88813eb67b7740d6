//! Annotations, annotation type declarations and their target locations.
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::APIType;
use crate::value::Value;

pub type Annotations = IndexMap<String, Annotation>;
pub type AnnotationTypes = IndexMap<String, AnnotationType>;

/// An applied annotation, `(name): value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub value: Option<Value>,
    /// Key with the surrounding brackets removed.
    pub name: String,
    /// Copy of the declaration this annotation refers to, once linked.
    pub annotation_type: Option<Box<AnnotationType>>,
}

impl Annotation {
    pub fn new(value: Option<Value>) -> Self {
        Self { value, ..Self::default() }
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Annotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Value>::deserialize(deserializer).map(Annotation::new)
    }
}

/// `(name)` → `name`; keys without brackets are returned as-is.
pub fn strip_brackets(key: &str) -> &str {
    key.strip_prefix('(').and_then(|k| k.strip_suffix(')')).unwrap_or(key)
}

pub fn is_annotation_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with('(') && key.ends_with(')')
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationType {
    #[serde(flatten)]
    pub api_type: APIType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_targets: Vec<TargetLocation>,
}

impl AnnotationType {
    /// An empty target list means the annotation may be applied anywhere.
    pub fn allows_any(&self, targets: &[TargetLocation]) -> bool {
        self.allowed_targets.is_empty() || targets.iter().any(|t| self.allowed_targets.contains(t))
    }
}

/// Where in a document an annotation may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLocation {
    /// The root of a RAML document.
    API,
    DocumentationItem,
    Resource,
    Method,
    Response,
    RequestBody,
    ResponseBody,
    /// A type declaration, header, query/URI parameter or property.
    TypeDeclaration,
    /// Either an `example` or an `examples` node.
    Example,
    ResourceType,
    Trait,
    SecurityScheme,
    SecuritySchemeSettings,
    AnnotationType,
    /// The root of a library.
    Library,
    Overlay,
    Extension,
}

impl TargetLocation {
    pub const ALL: [TargetLocation; 17] = [
        TargetLocation::API,
        TargetLocation::DocumentationItem,
        TargetLocation::Resource,
        TargetLocation::Method,
        TargetLocation::Response,
        TargetLocation::RequestBody,
        TargetLocation::ResponseBody,
        TargetLocation::TypeDeclaration,
        TargetLocation::Example,
        TargetLocation::ResourceType,
        TargetLocation::Trait,
        TargetLocation::SecurityScheme,
        TargetLocation::SecuritySchemeSettings,
        TargetLocation::AnnotationType,
        TargetLocation::Library,
        TargetLocation::Overlay,
        TargetLocation::Extension,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetLocation::API => "API",
            TargetLocation::DocumentationItem => "DocumentationItem",
            TargetLocation::Resource => "Resource",
            TargetLocation::Method => "Method",
            TargetLocation::Response => "Response",
            TargetLocation::RequestBody => "RequestBody",
            TargetLocation::ResponseBody => "ResponseBody",
            TargetLocation::TypeDeclaration => "TypeDeclaration",
            TargetLocation::Example => "Example",
            TargetLocation::ResourceType => "ResourceType",
            TargetLocation::Trait => "Trait",
            TargetLocation::SecurityScheme => "SecurityScheme",
            TargetLocation::SecuritySchemeSettings => "SecuritySchemeSettings",
            TargetLocation::AnnotationType => "AnnotationType",
            TargetLocation::Library => "Library",
            TargetLocation::Overlay => "Overlay",
            TargetLocation::Extension => "Extension",
        }
    }
}

impl fmt::Display for TargetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetLocation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetLocation::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}
