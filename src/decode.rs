//! YAML → document tree.
//!
//! Every node is classified (null / scalar / sequence / mapping / tagged)
//! before it is decoded, and the shape picks the decoder:
//! - nodes that may be a bare name (type, trait, library path) take the
//!   scalar form from scalars and the structured form from mappings;
//! - any other shape is a `WrongShape` error at the node's path.
//! Leaf fields go through serde so errors carry the nested path.
use serde_yaml::Value as Yaml;
use serde_yaml::value::TaggedValue;

use crate::annotation::{Annotation, AnnotationType, Annotations, TargetLocation, is_annotation_key};
use crate::document::{Bodies, DocumentationItem, HTTP_METHODS, Method, Resource, Resources, Response, Responses, RootDocument};
use crate::error::{Error, Result};
use crate::example::{Example, Examples};
use crate::library::{Library, Trait, Use};
use crate::path_de::from_yaml_with_path;
use crate::types::{APIType, Properties, Property, Raw};
use crate::value::{Value, yaml_key_string};

const INCLUDE_TAG: &str = "!include";
const EXAMPLE_KEYS: [&str; 4] = ["value", "displayName", "description", "strict"];

// ————————————————————————————————————————————————————————————————————————————
// SHAPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'a> {
    Null,
    Scalar,
    Sequence(&'a [Yaml]),
    Mapping(&'a serde_yaml::Mapping),
    Tagged(&'a TaggedValue),
}

pub(crate) fn classify(node: &Yaml) -> Shape<'_> {
    match node {
        Yaml::Null => Shape::Null,
        Yaml::Bool(_) | Yaml::Number(_) | Yaml::String(_) => Shape::Scalar,
        Yaml::Sequence(items) => Shape::Sequence(items),
        Yaml::Mapping(map) => Shape::Mapping(map),
        Yaml::Tagged(tagged) => Shape::Tagged(tagged),
    }
}

impl Shape<'_> {
    fn name(&self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Scalar => "a scalar",
            Shape::Sequence(_) => "a sequence",
            Shape::Mapping(_) => "a mapping",
            Shape::Tagged(_) => "a tagged value",
        }
    }
}

fn wrong_shape(path: &str, expected: &'static str, node: &Yaml) -> Error {
    Error::WrongShape { path: path.to_string(), expected, found: classify(node).name() }
}

fn include_path(tagged: &TaggedValue, path: &str) -> Result<Option<String>> {
    if tagged.tag != INCLUDE_TAG {
        return Ok(None);
    }
    text(&tagged.value, path).map(Some)
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_string() } else { format!("{path}.{key}") }
}

// ————————————————————————————————————————————————————————————————————————————
// MAPPING FIELDS
// ————————————————————————————————————————————————————————————————————————————

/// The entries of one mapping node, taken out by key as they are decoded.
struct Fields<'a> {
    path: String,
    entries: Vec<(String, Option<&'a Yaml>)>,
}

impl<'a> Fields<'a> {
    fn of(node: &'a Yaml, path: &str) -> Result<Self> {
        Ok(Self { path: path.to_string(), entries: entries(node, path)?.into_iter().map(|(k, v)| (k, Some(v))).collect() })
    }

    fn at(&self, key: &str) -> String {
        join(&self.path, key)
    }

    fn take(&mut self, key: &str) -> Option<&'a Yaml> {
        self.entries.iter_mut().find(|(k, _)| k == key).and_then(|(_, v)| v.take())
    }

    fn take_matching(&mut self, wanted: impl Fn(&str) -> bool) -> Vec<(String, &'a Yaml)> {
        let mut out = Vec::new();
        for (key, slot) in &mut self.entries {
            if wanted(key) {
                if let Some(node) = slot.take() {
                    out.push((key.clone(), node));
                }
            }
        }
        out
    }

    fn text(&mut self, key: &str) -> Result<String> {
        let path = self.at(key);
        self.take(key).map(|node| text(node, &path)).transpose().map(Option::unwrap_or_default)
    }

    fn flag(&mut self, key: &str) -> Result<Option<bool>> {
        let path = self.at(key);
        self.take(key).map(|node| from_yaml_with_path::<bool>(node, &path)).transpose()
    }

    fn integer(&mut self, key: &str) -> Result<Option<i64>> {
        let path = self.at(key);
        self.take(key).map(|node| from_yaml_with_path::<i64>(node, &path)).transpose()
    }

    fn unsigned(&mut self, key: &str) -> Result<Option<u64>> {
        let path = self.at(key);
        self.take(key).map(|node| from_yaml_with_path::<u64>(node, &path)).transpose()
    }

    fn list(&mut self, key: &str) -> Result<Vec<String>> {
        let path = self.at(key);
        self.take(key).map(|node| string_list(node, &path)).transpose().map(Option::unwrap_or_default)
    }

    fn raw(&mut self, key: &str) -> Result<Option<Raw>> {
        match self.take(key) {
            None | Some(Yaml::Null) => Ok(None),
            Some(node) => Raw::from_yaml(node).map(Some),
        }
    }

    fn properties(&mut self, key: &str) -> Result<Properties> {
        let path = self.at(key);
        self.take(key).map(|node| properties(node, &path)).transpose().map(Option::unwrap_or_default)
    }

    fn annotations(&mut self) -> Result<Annotations> {
        let mut out = Annotations::new();
        for (key, node) in self.take_matching(is_annotation_key) {
            let value = match node {
                Yaml::Null => None,
                other => Some(Value::from_yaml(other)?),
            };
            out.insert(key, Annotation::new(value));
        }
        Ok(out)
    }

    fn remaining(self) -> Vec<String> {
        self.entries.into_iter().filter(|(_, v)| v.is_some()).map(|(k, _)| k).collect()
    }

    fn ignore_rest(self, what: &str) {
        let path = self.path.clone();
        for key in self.remaining() {
            tracing::debug!(%path, %key, "ignoring unsupported key in {what}");
        }
    }
}

fn entries<'a>(node: &'a Yaml, path: &str) -> Result<Vec<(String, &'a Yaml)>> {
    match classify(node) {
        Shape::Null => Ok(Vec::new()),
        Shape::Mapping(map) => map.iter().map(|(k, v)| Ok((yaml_key_string(k)?, v))).collect(),
        _ => Err(wrong_shape(path, "a mapping", node)),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LEAVES
// ————————————————————————————————————————————————————————————————————————————

fn text(node: &Yaml, path: &str) -> Result<String> {
    match node {
        Yaml::Null => Ok(String::new()),
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        _ => Err(wrong_shape(path, "a scalar", node)),
    }
}

fn string_list(node: &Yaml, path: &str) -> Result<Vec<String>> {
    match classify(node) {
        Shape::Null => Ok(Vec::new()),
        Shape::Scalar => Ok(vec![text(node, path)?]),
        Shape::Sequence(_) => from_yaml_with_path::<Vec<String>>(node, path),
        _ => Err(wrong_shape(path, "a string or a list of strings", node)),
    }
}

/// `type:` is a name; a list (multiple inheritance) or mapping (inline
/// declaration) is kept as its JSON text, which makes the type inline.
fn type_name(node: &Yaml, path: &str) -> Result<String> {
    match classify(node) {
        Shape::Null | Shape::Scalar => text(node, path),
        Shape::Sequence(_) | Shape::Mapping(_) => {
            let raw = Raw::from_yaml(node)?;
            serde_json::to_string(&raw.0).map_err(|e| Error::decode(path, e))
        }
        Shape::Tagged(_) => Err(wrong_shape(path, "a type name or declaration", node)),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn api_type(node: &Yaml, path: &str) -> Result<APIType> {
    match classify(node) {
        Shape::Null => Ok(APIType::default()),
        Shape::Scalar => Ok(APIType::with_type(text(node, path)?)),
        Shape::Mapping(_) => {
            let mut fields = Fields::of(node, path)?;
            let api_type = api_type_fields(&mut fields)?;
            fields.ignore_rest("type declaration");
            Ok(api_type)
        }
        _ => Err(wrong_shape(path, "a type name or declaration", node)),
    }
}

fn api_type_fields(fields: &mut Fields<'_>) -> Result<APIType> {
    let mut api_type = APIType::default();
    let mut name = match fields.take("type") {
        Some(node) => type_name(node, &fields.at("type"))?,
        None => String::new(),
    };

    let decl = &mut api_type.declaration;
    decl.default = fields.raw("default")?;
    decl.schema = fields.raw("schema")?;
    if let Some(node) = fields.take("example") {
        decl.example = example(node, &fields.at("example"))?;
    }
    if let Some(node) = fields.take("examples") {
        decl.examples = examples(node, &fields.at("examples"))?;
    }
    decl.display_name = fields.text("displayName")?;
    decl.description = fields.text("description")?;
    decl.annotations = fields.annotations()?;
    decl.facets = fields.raw("facets")?;
    decl.xml = fields.raw("xml")?;

    let object = &mut api_type.object;
    object.properties = fields.properties("properties")?;
    object.min_properties = fields.unsigned("minProperties")?;
    object.max_properties = fields.unsigned("maxProperties")?;
    if let Some(additional) = fields.flag("additionalProperties")? {
        object.additional_properties = additional;
    }
    object.discriminator = fields.take("discriminator").map(|n| text(n, &fields.at("discriminator"))).transpose()?;
    object.discriminator_value = fields.raw("discriminatorValue")?;

    if let Some(node) = fields.take("enum") {
        api_type.scalar.enumeration = match Value::from_yaml(node)? {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            single => vec![single],
        };
    }

    api_type.string.pattern = fields.text("pattern")?;

    let array = &mut api_type.array;
    array.unique_items = fields.flag("uniqueItems")?.unwrap_or(false);
    array.items = fields.raw("items")?;
    if let Some(min) = fields.integer("minItems")? {
        array.min_items = min;
    }
    if let Some(max) = fields.integer("maxItems")? {
        array.max_items = max;
    }

    api_type.file.file_types = fields.list("fileTypes")?;

    if name.is_empty() && !api_type.object.properties.is_empty() {
        name = "object".to_string();
    }
    // minLength/maxLength belong to whichever group the base type selects
    let is_file = name.strip_suffix("[]").unwrap_or(&name) == "file";
    let min_length = fields.integer("minLength")?;
    let max_length = fields.integer("maxLength")?;
    if is_file {
        api_type.file.min_length = min_length.unwrap_or(api_type.file.min_length);
        api_type.file.max_length = max_length.unwrap_or(api_type.file.max_length);
    } else {
        api_type.string.min_length = min_length.unwrap_or(api_type.string.min_length);
        api_type.string.max_length = max_length.unwrap_or(api_type.string.max_length);
    }

    api_type.set_type(name);
    Ok(api_type)
}

fn property(name: &str, node: &Yaml, path: &str) -> Result<Property> {
    match classify(node) {
        Shape::Mapping(_) => {
            let mut fields = Fields::of(node, path)?;
            let required = fields.flag("required")?.unwrap_or(true);
            let api_type = api_type_fields(&mut fields)?;
            fields.ignore_rest("property");
            Ok(Property { api_type, required, name: name.to_string() })
        }
        _ => Ok(Property { api_type: api_type(node, path)?, required: true, name: name.to_string() }),
    }
}

pub(crate) fn properties(node: &Yaml, path: &str) -> Result<Properties> {
    let mut out = Properties::new();
    for (name, value) in entries(node, path)? {
        let property = property(&name, value, &join(path, &name))?;
        out.insert(name, property);
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// EXAMPLES
// ————————————————————————————————————————————————————————————————————————————

fn example(node: &Yaml, path: &str) -> Result<Option<Example>> {
    match classify(node) {
        Shape::Null => Ok(None),
        Shape::Tagged(tagged) => match include_path(tagged, path)? {
            Some(file) => Ok(Some(Example::included(file))),
            None => Ok(Some(Example::new(Value::from_yaml(node)?))),
        },
        Shape::Mapping(map) if is_structured_example(map) => {
            let mut fields = Fields::of(node, path)?;
            let mut example = match fields.take("value") {
                Some(Yaml::Tagged(tagged)) => match include_path(tagged, &fields.at("value"))? {
                    Some(file) => Example::included(file),
                    None => Example::new(Value::from_yaml(&tagged.value)?),
                },
                Some(Yaml::Null) | None => Example::default(),
                Some(value) => Example::new(Value::from_yaml(value)?),
            };
            example.display_name = fields.text("displayName")?;
            example.description = fields.text("description")?;
            example.strict = fields.flag("strict")?.unwrap_or(true);
            example.annotations = fields.annotations()?;
            Ok(Some(example))
        }
        _ => Ok(Some(Example::new(Value::from_yaml(node)?))),
    }
}

/// A mapping with a `value` key and nothing but example facets besides.
fn is_structured_example(map: &serde_yaml::Mapping) -> bool {
    let keys: Vec<String> = map.keys().filter_map(|k| k.as_str().map(str::to_string)).collect();
    keys.len() == map.len()
        && keys.iter().any(|k| k == "value")
        && keys.iter().all(|k| EXAMPLE_KEYS.contains(&k.as_str()) || is_annotation_key(k))
}

fn examples(node: &Yaml, path: &str) -> Result<Examples> {
    let mut out = Examples::new();
    for (name, value) in entries(node, path)? {
        if let Some(example) = example(value, &join(path, &name))? {
            out.insert(name, example);
        }
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATION TYPES
// ————————————————————————————————————————————————————————————————————————————

fn annotation_type(node: &Yaml, path: &str) -> Result<AnnotationType> {
    match classify(node) {
        Shape::Mapping(_) => {
            let mut fields = Fields::of(node, path)?;
            let allowed_targets = match fields.take("allowedTargets") {
                Some(targets) => target_locations(targets, &fields.at("allowedTargets"))?,
                None => Vec::new(),
            };
            let api_type = api_type_fields(&mut fields)?;
            fields.ignore_rest("annotation type");
            Ok(AnnotationType { api_type, allowed_targets })
        }
        _ => Ok(AnnotationType { api_type: api_type(node, path)?, allowed_targets: Vec::new() }),
    }
}

fn target_locations(node: &Yaml, path: &str) -> Result<Vec<TargetLocation>> {
    string_list(node, path)?
        .into_iter()
        .map(|name| {
            name.parse::<TargetLocation>()
                .map_err(|()| Error::InvalidTargetLocation { path: path.to_string(), name })
        })
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// TRAITS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn trait_declaration(node: &Yaml, path: &str) -> Result<Trait> {
    match classify(node) {
        Shape::Null => Ok(Trait::default()),
        Shape::Scalar => Ok(Trait { source: Some(text(node, path)?), ..Trait::default() }),
        Shape::Tagged(tagged) => match include_path(tagged, path)? {
            Some(file) => Ok(Trait { source: Some(file), ..Trait::default() }),
            None => Err(wrong_shape(path, "a trait declaration", node)),
        },
        Shape::Mapping(_) => {
            let mut fields = Fields::of(node, path)?;
            let usage = fields.text("usage")?;
            let resource_path = fields.text("resourcePath")?;
            let resource_path_name = fields.text("resourcePathName")?;
            let method_name = fields.text("methodName")?;
            let method = method_fields(fields)?;
            Ok(Trait { method, usage, resource_path, resource_path_name, method_name, ..Trait::default() })
        }
        Shape::Sequence(_) => Err(wrong_shape(path, "a trait declaration", node)),
    }
}

fn trait_usage(node: &Yaml, path: &str) -> Result<Trait> {
    match classify(node) {
        Shape::Scalar => Ok(Trait::usage_of(text(node, path)?)),
        Shape::Mapping(map) if map.len() == 1 => {
            let (name, _) = entries(node, path)?.into_iter().next().ok_or_else(|| Error::decode(path, "empty trait usage"))?;
            tracing::warn!(%path, trait_name = %name, "trait parameters are not supported and were ignored");
            Ok(Trait::usage_of(name))
        }
        _ => Err(wrong_shape(path, "a trait name", node)),
    }
}

fn trait_usages(node: &Yaml, path: &str) -> Result<Vec<Trait>> {
    match classify(node) {
        Shape::Null => Ok(Vec::new()),
        Shape::Sequence(items) => {
            items.iter().enumerate().map(|(i, item)| trait_usage(item, &format!("{path}[{i}]"))).collect()
        }
        _ => Ok(vec![trait_usage(node, path)?]),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// METHODS, RESPONSES, BODIES
// ————————————————————————————————————————————————————————————————————————————

fn method(node: &Yaml, path: &str) -> Result<Method> {
    match classify(node) {
        Shape::Null => Ok(Method::default()),
        Shape::Mapping(_) => method_fields(Fields::of(node, path)?),
        _ => Err(wrong_shape(path, "a method", node)),
    }
}

/// Decode method facets; whatever is left over is kept for the typo check.
fn method_fields(mut fields: Fields<'_>) -> Result<Method> {
    let mut method = Method {
        display_name: fields.text("displayName")?,
        description: fields.text("description")?,
        annotations: fields.annotations()?,
        query_parameters: fields.properties("queryParameters")?,
        headers: fields.properties("headers")?,
        query_string: fields.raw("queryString")?,
        protocols: fields.list("protocols")?,
        secured_by: fields.raw("securedBy")?,
        ..Method::default()
    };
    if let Some(node) = fields.take("responses") {
        method.responses = responses(node, &fields.at("responses"))?;
    }
    if let Some(node) = fields.take("body") {
        method.bodies = bodies(node, &fields.at("body"))?;
    }
    if let Some(node) = fields.take("is") {
        method.is = trait_usages(node, &fields.at("is"))?;
    }
    method.unexpected = fields.remaining();
    Ok(method)
}

fn responses(node: &Yaml, path: &str) -> Result<Responses> {
    let mut out = Responses::new();
    for (code, value) in entries(node, path)? {
        let at = join(path, &code);
        let status = code.parse::<u16>().map_err(|_| Error::decode(&at, format!("invalid status code {code:?}")))?;
        out.insert(status, response(value, &at)?);
    }
    Ok(out)
}

fn response(node: &Yaml, path: &str) -> Result<Response> {
    let mut fields = Fields::of(node, path)?;
    let mut response = Response {
        description: fields.text("description")?,
        annotations: fields.annotations()?,
        headers: fields.properties("headers")?,
        ..Response::default()
    };
    if let Some(body) = fields.take("body") {
        response.bodies = bodies(body, &fields.at("body"))?;
    }
    fields.ignore_rest("response");
    Ok(response)
}

/// A mapping keyed by media types, or a single body without one.
fn bodies(node: &Yaml, path: &str) -> Result<Bodies> {
    let mut out = Bodies::new();
    match classify(node) {
        Shape::Null => {}
        Shape::Mapping(_) => {
            let keyed = entries(node, path)?;
            if keyed.iter().any(|(key, _)| key.contains('/')) {
                for (media_type, value) in keyed {
                    let body = api_type(value, &join(path, &media_type))?;
                    out.insert(media_type, body);
                }
            } else {
                out.insert(String::new(), api_type(node, path)?);
            }
        }
        Shape::Scalar => {
            out.insert(String::new(), api_type(node, path)?);
        }
        _ => return Err(wrong_shape(path, "a body declaration", node)),
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// RESOURCES, LIBRARIES, ROOT
// ————————————————————————————————————————————————————————————————————————————

fn resource(node: &Yaml, path: &str) -> Result<Resource> {
    let mut fields = Fields::of(node, path)?;
    let mut resource = Resource {
        display_name: fields.text("displayName")?,
        description: fields.text("description")?,
        annotations: fields.annotations()?,
        resource_type: fields.raw("type")?,
        secured_by: fields.raw("securedBy")?,
        uri_parameters: fields.properties("uriParameters")?,
        ..Resource::default()
    };
    for name in HTTP_METHODS {
        if let Some(node) = fields.take(name) {
            resource.methods.insert(name.to_string(), method(node, &fields.at(name))?);
        }
    }
    if let Some(node) = fields.take("is") {
        resource.is = trait_usages(node, &fields.at("is"))?;
    }
    resource.resources = resources(&mut fields)?;
    fields.ignore_rest("resource");
    Ok(resource)
}

fn resources(fields: &mut Fields<'_>) -> Result<Resources> {
    let mut out = Resources::new();
    for (key, node) in fields.take_matching(|key| key.starts_with('/')) {
        let child = resource(node, &fields.at(&key))?;
        out.insert(key, child);
    }
    Ok(out)
}

fn use_entry(node: &Yaml, path: &str) -> Result<Use> {
    match classify(node) {
        Shape::Scalar => Ok(Use::External(text(node, path)?)),
        Shape::Tagged(tagged) => match include_path(tagged, path)? {
            Some(file) => Ok(Use::External(file)),
            None => Err(wrong_shape(path, "a library path", node)),
        },
        Shape::Mapping(_) => Ok(Use::Inline(Box::new(library(node, path)?))),
        _ => Err(wrong_shape(path, "a library path", node)),
    }
}

fn library_fields(fields: &mut Fields<'_>) -> Result<Library> {
    let mut library = Library {
        usage: fields.text("usage")?,
        schemas: fields.raw("schemas")?,
        resource_types: fields.raw("resourceTypes")?,
        security_schemes: fields.raw("securitySchemes")?,
        annotations: fields.annotations()?,
        ..Library::default()
    };
    if let Some(node) = fields.take("types") {
        let at = fields.at("types");
        for (name, value) in entries(node, &at)? {
            let declared = api_type(value, &join(&at, &name))?;
            library.types.insert(name, declared);
        }
    }
    if let Some(node) = fields.take("traits") {
        let at = fields.at("traits");
        for (name, value) in entries(node, &at)? {
            let declared = trait_declaration(value, &join(&at, &name))?;
            library.traits.insert(name, declared);
        }
    }
    if let Some(node) = fields.take("annotationTypes") {
        let at = fields.at("annotationTypes");
        for (name, value) in entries(node, &at)? {
            let declared = annotation_type(value, &join(&at, &name))?;
            library.annotation_types.insert(name, declared);
        }
    }
    if let Some(node) = fields.take("uses") {
        let at = fields.at("uses");
        for (name, value) in entries(node, &at)? {
            let entry = use_entry(value, &join(&at, &name))?;
            library.uses.insert(name, entry);
        }
    }
    Ok(library)
}

pub(crate) fn library(node: &Yaml, path: &str) -> Result<Library> {
    let mut fields = Fields::of(node, path)?;
    let library = library_fields(&mut fields)?;
    fields.ignore_rest("library");
    Ok(library)
}

pub(crate) fn root_document(node: &Yaml) -> Result<RootDocument> {
    let mut fields = Fields::of(node, "")?;
    let mut doc = RootDocument {
        title: fields.text("title")?,
        description: fields.text("description")?,
        version: fields.text("version")?,
        base_uri: fields.text("baseUri")?,
        base_uri_parameters: fields.properties("baseUriParameters")?,
        protocols: fields.list("protocols")?,
        media_type: fields.list("mediaType")?,
        secured_by: fields.raw("securedBy")?,
        ..RootDocument::default()
    };
    if let Some(node) = fields.take("documentation") {
        doc.documentation = from_yaml_with_path::<Vec<DocumentationItem>>(node, "documentation")?;
    }
    doc.library = library_fields(&mut fields)?;
    doc.resources = resources(&mut fields)?;
    fields.ignore_rest("root document");
    Ok(doc)
}
