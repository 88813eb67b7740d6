//! Depth-first traversal shared by every pass.
//!
//! Values and annotation back-references are never entered. Entering an
//! inline `uses` library switches the context's scope until it is left.
use crate::annotation::TargetLocation;
use crate::document::{Bodies, Method, Resource, RootDocument};
use crate::error::Result;
use crate::library::{Library, Trait, Use};
use crate::types::{APIType, Properties};

use super::{Context, Pass};

pub(super) fn root(pass: &mut dyn Pass, cx: &mut Context<'_>, doc: &mut RootDocument) -> Result<()> {
    let target = cx.root_target;
    library(pass, cx, &mut doc.library, target)?;
    for (key, node) in doc.resources.iter_mut() {
        resource(pass, cx, key, node)?;
    }
    properties(pass, cx, &mut doc.base_uri_parameters)
}

fn library(pass: &mut dyn Pass, cx: &mut Context<'_>, lib: &mut Library, target: TargetLocation) -> Result<()> {
    pass.library(cx, lib)?;

    // 1) declarations
    for declared in lib.types.values_mut() {
        api_type(pass, cx, declared, &[TargetLocation::TypeDeclaration])?;
    }
    for declared in lib.traits.values_mut() {
        trait_node(pass, cx, declared)?;
    }
    pass.annotation_types(cx, &mut lib.annotation_types)?;
    for declared in lib.annotation_types.values_mut() {
        api_type(pass, cx, &mut declared.api_type, &[TargetLocation::AnnotationType])?;
    }

    // 2) annotations applied to the library (or API) itself
    pass.annotations(cx, &mut lib.annotations, &[target])?;

    // 3) nested libraries, each in its own scope
    for (namespace, entry) in lib.uses.iter_mut() {
        pass.use_entry(cx, namespace, entry)?;
        if let Use::Inline(nested) = entry {
            cx.enter(namespace, nested);
            let walked = library(pass, cx, nested, TargetLocation::Library);
            cx.leave();
            walked?;
        }
    }
    Ok(())
}

fn api_type(pass: &mut dyn Pass, cx: &mut Context<'_>, api: &mut APIType, targets: &[TargetLocation]) -> Result<()> {
    pass.api_type(cx, api)?;
    pass.annotations(cx, &mut api.declaration.annotations, targets)?;
    for example in api.examples_iter_mut() {
        pass.annotations(cx, &mut example.annotations, &[TargetLocation::Example])?;
    }
    properties(pass, cx, &mut api.object.properties)
}

fn properties(pass: &mut dyn Pass, cx: &mut Context<'_>, props: &mut Properties) -> Result<()> {
    pass.properties(cx, props)?;
    for property in props.values_mut() {
        api_type(pass, cx, &mut property.api_type, &[TargetLocation::TypeDeclaration])?;
    }
    Ok(())
}

fn trait_node(pass: &mut dyn Pass, cx: &mut Context<'_>, node: &mut Trait) -> Result<()> {
    pass.trait_node(cx, node)?;
    method_body(pass, cx, &mut node.method, TargetLocation::Trait)
}

fn resource(pass: &mut dyn Pass, cx: &mut Context<'_>, key: &str, node: &mut Resource) -> Result<()> {
    pass.resource(cx, key, node)?;
    pass.annotations(cx, &mut node.annotations, &[TargetLocation::Resource])?;
    properties(pass, cx, &mut node.uri_parameters)?;
    for usage in node.is.iter_mut() {
        trait_node(pass, cx, usage)?;
    }
    for method in node.methods.values_mut() {
        pass.method(cx, method)?;
        method_body(pass, cx, method, TargetLocation::Method)?;
    }
    for (child_key, child) in node.resources.iter_mut() {
        resource(pass, cx, child_key, child)?;
    }
    Ok(())
}

/// The method-shaped part shared by methods and traits.
fn method_body(pass: &mut dyn Pass, cx: &mut Context<'_>, method: &mut Method, target: TargetLocation) -> Result<()> {
    pass.annotations(cx, &mut method.annotations, &[target])?;
    properties(pass, cx, &mut method.query_parameters)?;
    properties(pass, cx, &mut method.headers)?;
    for usage in method.is.iter_mut() {
        trait_node(pass, cx, usage)?;
    }
    bodies(pass, cx, &mut method.bodies, TargetLocation::RequestBody)?;
    for response in method.responses.values_mut() {
        pass.annotations(cx, &mut response.annotations, &[TargetLocation::Response])?;
        properties(pass, cx, &mut response.headers)?;
        bodies(pass, cx, &mut response.bodies, TargetLocation::ResponseBody)?;
    }
    Ok(())
}

fn bodies(pass: &mut dyn Pass, cx: &mut Context<'_>, node: &mut Bodies, site: TargetLocation) -> Result<()> {
    pass.bodies(cx, node)?;
    for body in node.values_mut() {
        api_type(pass, cx, body, &[TargetLocation::TypeDeclaration, site])?;
    }
    Ok(())
}
