//! The passes of a parse, in the order they run.
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotation::{AnnotationTypes, Annotations, TargetLocation, strip_brackets};
use crate::check::check_value_api_type;
use crate::decode;
use crate::document::{Bodies, Method, Resource, RootDocument};
use crate::error::{Error, Result};
use crate::example::{ExampleGenerator, IncludeLoader};
use crate::library::{Library, Trait, Use};
use crate::parser::load_yaml;
use crate::types::{APIType, DEFAULT_MAX, NativeType, Properties, Property, fix_required_by_syntax};
use crate::value::Value;

use super::resolve::{Snapshot, fill_api_type, link_annotations, resolve_library};
use super::{Context, Pass};

static URI_PARAMETER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("valid regex"));

// ————————————————————————————————————————————————————————————————————————————
// LOADING & NORMALIZATION
// ————————————————————————————————————————————————————————————————————————————

/// Replace path-valued `uses` entries and trait declarations with the
/// decoded file, relative to the directory of the including file.
pub(crate) struct LoadExternalUse;

impl Pass for LoadExternalUse {
    fn name(&self) -> &'static str {
        "loadExternalUse"
    }

    fn use_entry(&mut self, cx: &mut Context<'_>, namespace: &str, entry: &mut Use) -> Result<()> {
        let Use::External(file) = entry else {
            return Ok(());
        };
        let full = cx.directory().join(file.as_str());
        let library =
            load_library(cx, &full).map_err(|e| Error::LibraryLoad { path: full.clone(), source: Box::new(e) })?;
        tracing::info!(namespace, path = %full.display(), "loaded library");
        *entry = Use::Inline(Box::new(library));
        Ok(())
    }

    fn trait_node(&mut self, cx: &mut Context<'_>, node: &mut Trait) -> Result<()> {
        let Some(file) = node.source.take() else {
            return Ok(());
        };
        let full = cx.directory().join(&file);
        let bytes = cx.source.read(&full).map_err(|e| Error::io(&full, e))?;
        let loaded = decode::trait_declaration(&load_yaml(&bytes, cx.config)?, &file)?;
        tracing::debug!(path = %full.display(), "loaded trait");
        let reference = std::mem::take(&mut node.reference);
        *node = loaded;
        node.reference = reference;
        Ok(())
    }
}

fn load_library(cx: &Context<'_>, path: &Path) -> Result<Library> {
    let bytes = cx.source.read(path).map_err(|e| Error::io(path, e))?;
    let mut library = decode::library(&load_yaml(&bytes, cx.config)?, "")?;
    library.location = path.parent().map(Path::to_path_buf);
    Ok(library)
}

pub(crate) struct FixRequiredBySyntax;

impl Pass for FixRequiredBySyntax {
    fn name(&self) -> &'static str {
        "fixRequiredBySyntax"
    }

    fn properties(&mut self, _cx: &mut Context<'_>, properties: &mut Properties) -> Result<()> {
        fix_required_by_syntax(properties)
    }
}

/// Move a body declared without a media type under each default one.
pub(crate) struct FixDefaultMediaType;

impl Pass for FixDefaultMediaType {
    fn name(&self) -> &'static str {
        "fixDefaultMediaType"
    }

    fn bodies(&mut self, cx: &mut Context<'_>, bodies: &mut Bodies) -> Result<()> {
        // a standalone library has no defaults to apply
        let Some(media_types) = &cx.default_media_types else {
            return Ok(());
        };
        let Some(body) = bodies.shift_remove("") else {
            return Ok(());
        };
        if media_types.is_empty() {
            return Err(Error::MissingDefaultMediaType);
        }
        for media_type in media_types {
            bodies.entry(media_type.clone()).or_insert_with(|| body.clone());
        }
        Ok(())
    }
}

pub(crate) struct FixEmptyAnnotation;

impl Pass for FixEmptyAnnotation {
    fn name(&self) -> &'static str {
        "fixEmptyAnnotation"
    }

    fn annotations(&mut self, _cx: &mut Context<'_>, annotations: &mut Annotations, _: &[TargetLocation]) -> Result<()> {
        for annotation in annotations.values_mut() {
            annotation.value.get_or_insert(Value::Null);
        }
        Ok(())
    }

    fn annotation_types(&mut self, _cx: &mut Context<'_>, types: &mut AnnotationTypes) -> Result<()> {
        for declared in types.values_mut() {
            if declared.api_type.type_name().is_empty() {
                declared.api_type.set_type("string");
            }
        }
        Ok(())
    }
}

pub(crate) struct FixAnnotationBracket;

impl Pass for FixAnnotationBracket {
    fn name(&self) -> &'static str {
        "fixAnnotationBracket"
    }

    fn annotations(&mut self, _cx: &mut Context<'_>, annotations: &mut Annotations, _: &[TargetLocation]) -> Result<()> {
        let mut fixed = Annotations::with_capacity(annotations.len());
        for (key, mut annotation) in std::mem::take(annotations) {
            let name = strip_brackets(&key).to_string();
            annotation.name.clone_from(&name);
            fixed.insert(name, annotation);
        }
        *annotations = fixed;
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FILLING
// ————————————————————————————————————————————————————————————————————————————

/// Resolve the type tables, then inherit into every other type node and
/// link annotations to their declarations.
pub(crate) struct FillProperties;

impl Pass for FillProperties {
    fn name(&self) -> &'static str {
        "fillProperties"
    }

    fn prepare(&mut self, _cx: &mut Context<'_>, doc: &mut RootDocument) -> Result<()> {
        resolve_library(&mut doc.library)
    }

    fn api_type(&mut self, cx: &mut Context<'_>, api: &mut APIType) -> Result<()> {
        fill_api_type(api, &mut Snapshot(cx.library()), false)
    }

    fn annotations(&mut self, cx: &mut Context<'_>, annotations: &mut Annotations, _: &[TargetLocation]) -> Result<()> {
        link_annotations(cx.library(), annotations, true)
    }
}

/// Replace each `is:` usage with its declaration, keeping the name.
pub(crate) struct FillTrait;

impl Pass for FillTrait {
    fn name(&self) -> &'static str {
        "fillTrait"
    }

    fn trait_node(&mut self, cx: &mut Context<'_>, node: &mut Trait) -> Result<()> {
        if node.reference.is_empty() {
            return Ok(());
        }
        let declared = cx
            .library()
            .get_trait(&node.reference)
            .ok_or_else(|| Error::TraitUndefined { name: node.reference.clone() })?;
        let mut filled = declared.clone();
        // traits do not apply other traits
        filled.method.is.clear();
        filled.reference = std::mem::take(&mut node.reference);
        *node = filled;
        Ok(())
    }
}

/// Declare every `{name}` of a resource's own path segment.
pub(crate) struct FillUriParams;

impl Pass for FillUriParams {
    fn name(&self) -> &'static str {
        "fillURIParams"
    }

    fn resource(&mut self, _cx: &mut Context<'_>, key: &str, resource: &mut Resource) -> Result<()> {
        for captures in URI_PARAMETER.captures_iter(key) {
            let name = &captures[1];
            if !resource.uri_parameters.contains_key(name) {
                let mut parameter = Property::new(name, "");
                parameter.api_type.resolved = true;
                resource.uri_parameters.insert(name.to_string(), parameter);
            }
        }
        Ok(())
    }
}

/// Load `!include`d examples, then derive examples for types without one.
pub(crate) struct FillExample;

impl Pass for FillExample {
    fn name(&self) -> &'static str {
        "fillExample"
    }

    /// Declared types are read in with their own library's directory before
    /// any other scope derives from them.
    fn prepare(&mut self, cx: &mut Context<'_>, doc: &mut RootDocument) -> Result<()> {
        let directory = doc.working_directory.clone();
        materialize_declared(cx, &mut doc.library, &directory)
    }

    fn api_type(&mut self, cx: &mut Context<'_>, api: &mut APIType) -> Result<()> {
        let includes = IncludeLoader::new(cx.source, cx.directory());
        includes.materialize(api)?;
        ExampleGenerator::new(cx.library(), &includes).fill(api)?;
        Ok(())
    }
}

fn materialize_declared(cx: &Context<'_>, library: &mut Library, parent: &Path) -> Result<()> {
    let directory = library.location.clone().unwrap_or_else(|| parent.to_path_buf());
    let includes = IncludeLoader::new(cx.source, &directory);
    for api in library.types.values_mut() {
        includes.materialize(api)?;
    }
    for entry in library.uses.values_mut() {
        if let Use::Inline(nested) = entry {
            materialize_declared(cx, nested, &directory)?;
        }
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// CHECKS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) struct CheckTypo;

impl Pass for CheckTypo {
    fn name(&self) -> &'static str {
        "checkTypoError"
    }

    fn method(&mut self, _cx: &mut Context<'_>, method: &mut Method) -> Result<()> {
        reject_unexpected(method, "method")
    }

    fn trait_node(&mut self, _cx: &mut Context<'_>, node: &mut Trait) -> Result<()> {
        reject_unexpected(&node.method, "trait")
    }
}

fn reject_unexpected(method: &Method, node: &str) -> Result<()> {
    match method.unexpected.first() {
        Some(key) => Err(Error::Typo { key: key.clone(), node: node.to_string() }),
        None => Ok(()),
    }
}

/// Strike every applied annotation from the set of declared ones, and
/// reject annotations applied where their declaration does not allow.
pub(crate) struct CheckUnusedAnnotation;

impl Pass for CheckUnusedAnnotation {
    fn name(&self) -> &'static str {
        "checkUnusedAnnotation"
    }

    fn prepare(&mut self, cx: &mut Context<'_>, doc: &mut RootDocument) -> Result<()> {
        cx.annotation_usage.extend(doc.library.annotation_types.keys().cloned());
        for (prefix, nested) in doc.library.nested() {
            cx.annotation_usage.extend(nested.annotation_types.keys().map(|name| format!("{prefix}{name}")));
        }
        Ok(())
    }

    fn annotations(&mut self, cx: &mut Context<'_>, annotations: &mut Annotations, targets: &[TargetLocation]) -> Result<()> {
        for annotation in annotations.values() {
            let used = format!("{}{}", cx.prefix(), annotation.name);
            cx.annotation_usage.remove(&used);
            if let Some(declared) = &annotation.annotation_type {
                if !declared.allows_any(targets) {
                    let target = targets.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ");
                    return Err(Error::AnnotationTargetNotAllowed { name: annotation.name.clone(), target });
                }
            }
        }
        Ok(())
    }
}

pub(crate) struct AfterCheckUnusedAnnotation;

impl Pass for AfterCheckUnusedAnnotation {
    fn name(&self) -> &'static str {
        "afterCheckUnusedAnnotation"
    }

    fn finish(&mut self, cx: &mut Context<'_>) -> Result<()> {
        if cx.annotation_usage.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = cx.annotation_usage.iter().cloned().collect();
        if cx.config.ignore_unused_annotation {
            tracing::debug!(?names, "ignoring unused annotation types");
            return Ok(());
        }
        Err(Error::UnusedAnnotation { names })
    }
}

pub(crate) struct CheckUnusedTrait;

impl Pass for CheckUnusedTrait {
    fn name(&self) -> &'static str {
        "checkUnusedTrait"
    }

    fn prepare(&mut self, cx: &mut Context<'_>, doc: &mut RootDocument) -> Result<()> {
        cx.trait_usage.extend(doc.library.traits.keys().cloned());
        for (prefix, nested) in doc.library.nested() {
            cx.trait_usage.extend(nested.traits.keys().map(|name| format!("{prefix}{name}")));
        }
        Ok(())
    }

    fn trait_node(&mut self, cx: &mut Context<'_>, node: &mut Trait) -> Result<()> {
        if !node.reference.is_empty() {
            let used = format!("{}{}", cx.prefix(), node.reference);
            cx.trait_usage.remove(&used);
        }
        Ok(())
    }
}

pub(crate) struct AfterCheckUnusedTrait;

impl Pass for AfterCheckUnusedTrait {
    fn name(&self) -> &'static str {
        "afterCheckUnusedTrait"
    }

    fn finish(&mut self, cx: &mut Context<'_>) -> Result<()> {
        if cx.trait_usage.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = cx.trait_usage.iter().cloned().collect();
        if cx.config.ignore_unused_trait {
            tracing::debug!(?names, "ignoring unused traits");
            return Ok(());
        }
        Err(Error::UnusedTrait { names })
    }
}

/// Validate every strict example against the type that owns it.
pub(crate) struct CheckExample;

impl Pass for CheckExample {
    fn name(&self) -> &'static str {
        "checkExample"
    }

    fn api_type(&mut self, cx: &mut Context<'_>, api: &mut APIType) -> Result<()> {
        for example in api.examples_iter() {
            if !example.strict {
                continue;
            }
            if let Some(value) = &example.value {
                check_value_api_type(api, value, &cx.config.check_value_options)?;
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CACHE
// ————————————————————————————————————————————————————————————————————————————

/// Restore derived fields, names, back-references and binary includes of a
/// document read back from its JSON form.
pub(crate) struct Rehydrate;

impl Pass for Rehydrate {
    fn name(&self) -> &'static str {
        "rehydrate"
    }

    fn api_type(&mut self, _cx: &mut Context<'_>, api: &mut APIType) -> Result<()> {
        let native = api.native_type.clone();
        api.refresh_derived();
        api.native_type = native;
        api.resolved = true;

        // both length groups read the same keys back; file types own them
        if api.native_type == NativeType::File && api.file.min_length == 0 && api.file.max_length == DEFAULT_MAX {
            api.file.min_length = std::mem::take(&mut api.string.min_length);
            api.file.max_length = std::mem::replace(&mut api.string.max_length, DEFAULT_MAX);
        }

        let is_file = api.native_type == NativeType::File;
        for example in api.examples_iter_mut() {
            if !example.include_tag {
                continue;
            }
            if is_file {
                if let Some(binary) = example.value.as_ref().and_then(Value::decode_binary) {
                    example.value = Some(binary);
                }
            }
            example.materialized = true;
        }
        Ok(())
    }

    fn properties(&mut self, _cx: &mut Context<'_>, properties: &mut Properties) -> Result<()> {
        for (name, property) in properties.iter_mut() {
            property.name.clone_from(name);
        }
        Ok(())
    }

    fn annotations(&mut self, cx: &mut Context<'_>, annotations: &mut Annotations, _: &[TargetLocation]) -> Result<()> {
        for (name, annotation) in annotations.iter_mut() {
            annotation.name.clone_from(name);
            annotation.value.get_or_insert(Value::Null);
        }
        link_annotations(cx.library(), annotations, false)
    }
}
