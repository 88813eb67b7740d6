//! Examples and the example generator.
//!
//! Derivation order for a type without its own `example`/`examples`:
//! - array: values of the element's base type (array values flattened),
//!   else one derived element wrapped in an array;
//! - the referenced base type's example, when it fits this type;
//! - object: one derived value per property (a required property that
//!   yields nothing means no example at all).
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotations;
use crate::check::{CheckValueOptions, check_value_api_type};
use crate::error::{Error, Result};
use crate::source::FileSource;
use crate::types::{APIType, NativeType, default_true, is_false, is_true};
use crate::value::Value;

/// Key of the synthesized entry in `examples`.
pub const AUTO_GENERATED: &str = "autoGenerated";

pub type Examples = IndexMap<String, Example>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Example {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// `false` turns off validation of this example.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub strict: bool,
    /// The value came from `!include`; until loaded it holds the path.
    #[serde(skip_serializing_if = "is_false")]
    pub include_tag: bool,
    #[serde(skip)]
    pub(crate) materialized: bool,
}

impl Default for Example {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            description: String::new(),
            annotations: Annotations::new(),
            value: None,
            strict: true,
            include_tag: false,
            materialized: false,
        }
    }
}

impl Example {
    pub fn new(value: Value) -> Self {
        Self { value: Some(value), ..Self::default() }
    }

    pub fn included(path: impl Into<String>) -> Self {
        Self { value: Some(Value::String(path.into())), include_tag: true, ..Self::default() }
    }

    fn pending_include(&self) -> Option<&str> {
        if self.include_tag && !self.materialized { self.value.as_ref()?.as_str() } else { None }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INCLUDES
// ————————————————————————————————————————————————————————————————————————————

/// Loads `!include`d example files relative to a directory.
pub struct IncludeLoader<'a> {
    source: &'a dyn FileSource,
    directory: &'a Path,
}

impl<'a> IncludeLoader<'a> {
    pub fn new(source: &'a dyn FileSource, directory: &'a Path) -> Self {
        Self { source, directory }
    }

    /// `file` owners get raw bytes; anything else is parsed as YAML/JSON,
    /// falling back to text.
    pub fn load(&self, path: &str, owner: &NativeType) -> Result<Value> {
        let full = self.directory.join(path);
        let bytes = self.source.read(&full).map_err(|e| Error::io(&full, e))?;
        tracing::debug!(path = %full.display(), bytes = bytes.len(), "loaded example include");
        if *owner == NativeType::File {
            return Ok(Value::Binary(bytes));
        }
        match serde_yaml::from_slice::<serde_yaml::Value>(&bytes) {
            Ok(node) => Value::from_yaml(&node),
            Err(_) => Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        }
    }

    /// The example's value with a pending include read in.
    pub fn value_of(&self, example: &Example, owner: &NativeType) -> Result<Option<Value>> {
        match example.pending_include() {
            Some(path) => self.load(path, owner).map(Some),
            None => Ok(example.value.clone()),
        }
    }

    /// Replace every pending include on `api` with the file content.
    pub fn materialize(&self, api: &mut APIType) -> Result<()> {
        let owner = api.native_type.clone();
        for example in api.examples_iter_mut() {
            if let Some(path) = example.pending_include() {
                example.value = Some(self.load(path, &owner)?);
                example.materialized = true;
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

/// Name → resolved declaration, as seen from one library scope.
pub trait TypeLookup {
    fn lookup_type(&self, name: &str) -> Option<&APIType>;
}

pub struct ExampleGenerator<'a> {
    types: &'a dyn TypeLookup,
    includes: &'a IncludeLoader<'a>,
    visiting: Vec<String>,
}

impl<'a> ExampleGenerator<'a> {
    pub fn new(types: &'a dyn TypeLookup, includes: &'a IncludeLoader<'a>) -> Self {
        Self { types, includes, visiting: Vec::new() }
    }

    /// Fill `example` and `examples["autoGenerated"]` when `api` declares
    /// neither. Returns whether anything was derived.
    pub fn fill(&mut self, api: &mut APIType) -> Result<bool> {
        if api.has_examples() {
            return Ok(false);
        }
        let Some(value) = self.derive(api)? else {
            return Ok(false);
        };
        api.declaration.example = Some(Example::new(value.clone()));
        api.declaration.examples.insert(AUTO_GENERATED.to_string(), Example::new(value));
        Ok(true)
    }

    pub fn derive(&mut self, api: &APIType) -> Result<Option<Value>> {
        if let Some(value) = self.first_declared(api)? {
            return Ok(Some(value));
        }
        if api.is_array {
            return self.derive_array(api);
        }
        if let Some(value) = self.from_base(api)? {
            return Ok(Some(value));
        }
        self.synthesize_object(api)
    }

    fn first_declared(&self, api: &APIType) -> Result<Option<Value>> {
        for example in api.examples_iter() {
            if let Some(value) = self.includes.value_of(example, &api.native_type)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn derive_array(&mut self, api: &APIType) -> Result<Option<Value>> {
        let types = self.types;
        let mut items = Vec::new();
        if api.needs_lookup() && !self.is_visiting(&api.base_type) {
            if let Some(base) = types.lookup_type(&api.base_type) {
                for example in base.examples_iter() {
                    match self.includes.value_of(example, &base.native_type)? {
                        Some(Value::Array(values)) => items.extend(values),
                        Some(value) => items.push(value),
                        None => {}
                    }
                }
            }
        }
        if !items.is_empty() {
            let collected = Value::Array(items);
            if fits(api, &collected) {
                return Ok(Some(collected));
            }
        }
        let mut element = api.clone();
        element.is_array = false;
        element.declaration.example = None;
        element.declaration.examples.clear();
        Ok(self.derive(&element)?.map(|value| Value::Array(vec![value])))
    }

    fn from_base(&mut self, api: &APIType) -> Result<Option<Value>> {
        if !api.needs_lookup() || self.is_visiting(&api.base_type) {
            return Ok(None);
        }
        let types = self.types;
        let Some(base) = types.lookup_type(&api.base_type) else {
            return Ok(None);
        };
        self.visiting.push(api.base_type.clone());
        let derived = self.derive(base);
        self.visiting.pop();
        Ok(derived?.filter(|value| fits(api, value)))
    }

    fn synthesize_object(&mut self, api: &APIType) -> Result<Option<Value>> {
        let properties = api.properties();
        if properties.is_empty() {
            return Ok(None);
        }
        let mut map = IndexMap::with_capacity(properties.len());
        for (name, property) in properties {
            match self.derive(&property.api_type)? {
                Some(value) => {
                    map.insert(name.clone(), value);
                }
                None if property.required => return Ok(None),
                None => {}
            }
        }
        Ok(Some(Value::Object(map)))
    }

    fn is_visiting(&self, name: &str) -> bool {
        self.visiting.iter().any(|n| n == name)
    }
}

fn fits(api: &APIType, value: &Value) -> bool {
    check_value_api_type(api, value, &CheckValueOptions::default()).is_ok()
}
