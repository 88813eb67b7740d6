//! Libraries (`uses`) and traits.
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::annotation::{AnnotationType, AnnotationTypes, Annotations};
use crate::document::Method;
use crate::example::TypeLookup;
use crate::types::{APIType, Raw};

pub type Types = IndexMap<String, APIType>;
pub type Traits = IndexMap<String, Trait>;
pub type Uses = IndexMap<String, Use>;

/// A bundle of declarations. The root document carries one too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Library {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Raw>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub types: Types,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub traits: Traits,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Raw>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotation_types: AnnotationTypes,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<Raw>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub uses: Uses,
    /// Directory of the file this library was read from, if any.
    #[serde(skip)]
    pub location: Option<PathBuf>,
}

/// An entry of `uses`: a path still to be loaded, or the loaded library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Use {
    External(String),
    Inline(Box<Library>),
}

impl Library {
    pub fn namespace(&self, name: &str) -> Option<&Library> {
        match self.uses.get(name)? {
            Use::Inline(library) => Some(library),
            Use::External(_) => None,
        }
    }

    /// Split `a.b.Name` into the library `a.b` and `Name`.
    fn qualified<'a, 'n>(&'a self, name: &'n str) -> Option<(&'a Library, &'n str)> {
        match name.split_once('.') {
            None => Some((self, name)),
            Some((namespace, rest)) => self.namespace(namespace)?.qualified(rest),
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&APIType> {
        let (library, local) = self.qualified(name)?;
        library.types.get(local)
    }

    pub fn get_trait(&self, name: &str) -> Option<&Trait> {
        let (library, local) = self.qualified(name)?;
        library.traits.get(local)
    }

    pub fn get_annotation_type(&self, name: &str) -> Option<&AnnotationType> {
        let (library, local) = self.qualified(name)?;
        library.annotation_types.get(local)
    }

    /// Nested libraries with their dotted namespace prefix (`"a."`, `"a.b."`).
    pub fn nested(&self) -> Vec<(String, &Library)> {
        let mut out = Vec::new();
        collect_nested(self, "", &mut out);
        out
    }
}

fn collect_nested<'a>(library: &'a Library, prefix: &str, out: &mut Vec<(String, &'a Library)>) {
    for (name, entry) in &library.uses {
        if let Use::Inline(nested) = entry {
            let prefix = format!("{prefix}{name}.");
            out.push((prefix.clone(), nested));
            collect_nested(nested, &prefix, out);
        }
    }
}

impl TypeLookup for Library {
    fn lookup_type(&self, name: &str) -> Option<&APIType> {
        self.get_type(name)
    }
}

/// A trait declaration (method-shaped) or a usage in `is:` (by name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trait {
    /// Name of the referenced trait; empty for declarations.
    #[serde(rename = "name", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(flatten)]
    pub method: Method,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub usage: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_path_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method_name: String,
    /// Path of an external trait file still to be loaded.
    #[serde(skip)]
    pub source: Option<String>,
}

impl Trait {
    pub fn usage_of(name: impl Into<String>) -> Self {
        Self { reference: name.into(), ..Self::default() }
    }
}
