//! The document tree: root, resources, methods, responses, bodies.
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotations;
use crate::library::{Library, Trait};
use crate::types::{APIType, Properties, Raw};

pub const HTTP_METHODS: [&str; 7] = ["get", "patch", "put", "post", "delete", "options", "head"];

/// Media type → body type. The empty key holds a body declared without
/// a media type until the default media type is applied.
pub type Bodies = IndexMap<String, APIType>;
pub type Responses = IndexMap<u16, Response>;
pub type Resources = IndexMap<String, Resource>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootDocument {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_uri: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub base_uri_parameters: Properties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_type: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<DocumentationItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secured_by: Option<Raw>,
    #[serde(flatten)]
    pub library: Library,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resources: Resources,
    #[serde(skip)]
    pub working_directory: PathBuf,
}

impl RootDocument {
    /// Look up a resource by its full path, e.g. `/users/{id}`.
    pub fn find_resource(&self, path: &str) -> Option<&Resource> {
        find_in(&self.resources, path)
    }
}

fn find_in<'a>(resources: &'a Resources, path: &str) -> Option<&'a Resource> {
    for (key, resource) in resources {
        if key == path {
            return Some(resource);
        }
        if let Some(rest) = path.strip_prefix(key.as_str()) {
            if rest.starts_with('/') {
                if let Some(found) = find_in(&resource.resources, rest) {
                    return Some(found);
                }
            }
        }
    }
    None
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationItem {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub methods: IndexMap<String, Method>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<Trait>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<Raw>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secured_by: Option<Raw>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub uri_parameters: Properties,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resources: Resources,
}

impl Resource {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Method {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub query_parameters: Properties,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<Raw>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: Responses,
    #[serde(rename = "body", skip_serializing_if = "IndexMap::is_empty")]
    pub bodies: Bodies,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<Trait>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secured_by: Option<Raw>,
    /// Keys the decoder did not recognize.
    #[serde(skip)]
    pub unexpected: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: Properties,
    #[serde(rename = "body", skip_serializing_if = "IndexMap::is_empty")]
    pub bodies: Bodies,
}
