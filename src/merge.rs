//! Inheritance: copy what a declaration leaves unset from its base type.
//!
//! Facet groups move as a whole; a group the derived type set itself is
//! never touched. `type` and the examples are never inherited.
use crate::annotation::Annotations;
use crate::types::{APIType, Raw, TypeDeclaration};

pub fn merge_api_type(dst: &mut APIType, from: &APIType) {
    merge_type_declaration(&mut dst.declaration, &from.declaration);

    if dst.object.is_empty() {
        dst.object = from.object.clone();
    }
    if dst.scalar.is_empty() {
        dst.scalar = from.scalar.clone();
    }
    if dst.string.is_empty() {
        dst.string = from.string.clone();
    }
    if dst.is_array && dst.array.is_empty() {
        dst.array = from.array.clone();
    }
    if dst.file.is_empty() {
        dst.file = from.file.clone();
    }

    dst.native_type = from.native_type.clone();
}

pub fn merge_type_declaration(dst: &mut TypeDeclaration, from: &TypeDeclaration) {
    fill_raw(&mut dst.default, &from.default);
    fill_raw(&mut dst.schema, &from.schema);
    if dst.display_name.is_empty() {
        dst.display_name.clone_from(&from.display_name);
    }
    if dst.description.is_empty() {
        dst.description.clone_from(&from.description);
    }
    merge_annotations(&mut dst.annotations, &from.annotations);
    fill_raw(&mut dst.facets, &from.facets);
    fill_raw(&mut dst.xml, &from.xml);
}

/// Add annotations from `from` that `dst` does not already apply.
pub fn merge_annotations(dst: &mut Annotations, from: &Annotations) {
    for (name, annotation) in from {
        if !dst.contains_key(name) {
            dst.insert(name.clone(), annotation.clone());
        }
    }
}

fn fill_raw(dst: &mut Option<Raw>, from: &Option<Raw>) {
    if dst.is_none() {
        dst.clone_from(from);
    }
}
