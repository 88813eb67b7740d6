//! Type resolution: fill every type from its base, to a fixed point.
//!
//! Declared types are resolved in place, nested `uses` libraries first, each
//! entry depth-first on its base and property types. A chain of base links
//! that returns to a type under resolution is a cycle; a chain that passes
//! through a property is a recursive structure and the referring node keeps
//! its name without copied facets.
use crate::annotation::Annotations;
use crate::error::{Error, Result};
use crate::library::{Library, Use};
use crate::merge::merge_api_type;
use crate::types::APIType;

pub(crate) enum Lookup {
    Found(APIType),
    /// Under resolution further up a property link.
    Pending,
    Missing,
}

pub(crate) trait TypeTable {
    fn lookup(&mut self, name: &str, via_property: bool) -> Result<Lookup>;
}

/// Inherit from the base type, then fill the properties.
pub(crate) fn fill_api_type(api: &mut APIType, table: &mut dyn TypeTable, in_property: bool) -> Result<()> {
    if api.resolved {
        return Ok(());
    }
    if api.needs_lookup() {
        match table.lookup(&api.base_type, in_property)? {
            Lookup::Found(base) => merge_api_type(api, &base),
            Lookup::Pending => {}
            Lookup::Missing => return Err(Error::TypeUndefined { name: api.base_type.clone() }),
        }
    }
    for property in api.object.properties.values_mut() {
        fill_api_type(&mut property.api_type, table, true)?;
    }
    api.resolved = true;
    Ok(())
}

/// Resolve every declared type of `library` and its nested libraries,
/// then the annotation type declarations against the resolved tables.
pub(crate) fn resolve_library(library: &mut Library) -> Result<()> {
    for entry in library.uses.values_mut() {
        if let Use::Inline(nested) = entry {
            resolve_library(nested)?;
        }
    }

    // inherited annotations keep the declaration of the library they come from
    let scope = library.clone();
    for declared in library.types.values_mut() {
        link_type_annotations(&scope, declared)?;
    }

    let names: Vec<String> = library.types.keys().cloned().collect();
    let mut resolver = Resolver { library: &mut *library, chain: Vec::new() };
    for name in names {
        resolver.lookup(&name, false)?;
    }

    let snapshot = library.clone();
    for declared in library.annotation_types.values_mut() {
        fill_api_type(&mut declared.api_type, &mut Snapshot(&snapshot), false)?;
    }
    Ok(())
}

/// Attach each annotation's declaration as seen from `library`. Annotations
/// already linked are left alone; unknown names fail only when `required`.
pub(crate) fn link_annotations(library: &Library, annotations: &mut Annotations, required: bool) -> Result<()> {
    for annotation in annotations.values_mut() {
        if annotation.annotation_type.is_some() {
            continue;
        }
        match library.get_annotation_type(&annotation.name) {
            Some(declared) => annotation.annotation_type = Some(Box::new(declared.clone())),
            None if required => return Err(Error::AnnotationUndefined { name: annotation.name.clone() }),
            None => {}
        }
    }
    Ok(())
}

fn link_type_annotations(library: &Library, api: &mut APIType) -> Result<()> {
    link_annotations(library, &mut api.declaration.annotations, false)?;
    for property in api.object.properties.values_mut() {
        link_type_annotations(library, &mut property.api_type)?;
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// TABLES
// ————————————————————————————————————————————————————————————————————————————

/// Resolves entries of a library's `types` in place as they are looked up.
struct Resolver<'a> {
    library: &'a mut Library,
    /// Types under resolution, with whether each was reached through a property.
    chain: Vec<(String, bool)>,
}

impl TypeTable for Resolver<'_> {
    fn lookup(&mut self, name: &str, via_property: bool) -> Result<Lookup> {
        if name.contains('.') {
            // other libraries are resolved before this one
            return Ok(match self.library.get_type(name) {
                Some(found) => Lookup::Found(found.clone()),
                None => Lookup::Missing,
            });
        }

        if let Some(start) = self.chain.iter().position(|(n, _)| n == name) {
            let through_property = via_property || self.chain[start + 1..].iter().any(|(_, p)| *p);
            if through_property {
                return Ok(Lookup::Pending);
            }
            let mut chain: Vec<String> = self.chain[start..].iter().map(|(n, _)| n.clone()).collect();
            chain.push(name.to_string());
            return Err(Error::CyclicType { name: name.to_string(), chain });
        }

        let Some(entry) = self.library.types.get(name) else {
            return Ok(Lookup::Missing);
        };
        if entry.resolved {
            return Ok(Lookup::Found(entry.clone()));
        }

        let mut filled = entry.clone();
        self.chain.push((name.to_string(), via_property));
        let result = fill_api_type(&mut filled, self, false);
        self.chain.pop();
        result?;

        tracing::trace!(type_name = name, native = %filled.native_type, "resolved type");
        self.library.types.insert(name.to_string(), filled.clone());
        Ok(Lookup::Found(filled))
    }
}

/// Lookups against a library whose types are already resolved.
pub(crate) struct Snapshot<'a>(pub &'a Library);

impl TypeTable for Snapshot<'_> {
    fn lookup(&mut self, name: &str, _via_property: bool) -> Result<Lookup> {
        Ok(match self.0.get_type(name) {
            Some(found) => Lookup::Found(found.clone()),
            None => Lookup::Missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NativeType, Property};

    fn object_with(props: &[(&str, &str)]) -> APIType {
        let mut api = APIType::with_type("object");
        for (name, type_name) in props {
            api.object.properties.insert(name.to_string(), Property::new(*name, type_name));
        }
        api
    }

    #[test]
    fn forward_references_and_chains_resolve() {
        let mut library = Library::default();
        library.types.insert("Admin".into(), APIType::with_type("Staff"));
        library.types.insert("Staff".into(), APIType::with_type("User"));
        library.types.insert("User".into(), object_with(&[("name", "Username")]));
        library.types.insert("Username".into(), APIType::with_type("string"));

        resolve_library(&mut library).unwrap();
        let admin = &library.types["Admin"];
        assert_eq!(admin.native_type, NativeType::Object);
        assert_eq!(admin.type_name(), "Staff");
        assert_eq!(admin.properties()["name"].api_type.native_type, NativeType::String);
        assert!(library.types.values().all(|t| t.resolved));
    }

    #[test]
    fn base_cycle_is_an_error() {
        let mut library = Library::default();
        library.types.insert("A".into(), APIType::with_type("B"));
        library.types.insert("B".into(), APIType::with_type("A"));
        match resolve_library(&mut library) {
            Err(Error::CyclicType { name, chain }) => {
                assert_eq!(name, "A");
                assert_eq!(chain, ["A", "B", "A"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn recursion_through_a_property_is_allowed() {
        let mut library = Library::default();
        library.types.insert("Node".into(), object_with(&[("value", "string"), ("children", "Node[]")]));
        resolve_library(&mut library).unwrap();
        let node = &library.types["Node"];
        let children = &node.properties()["children"].api_type;
        assert!(children.is_array);
        assert_eq!(children.base_type, "Node");
    }

    #[test]
    fn unknown_type_is_reported() {
        let mut library = Library::default();
        library.types.insert("User".into(), object_with(&[("group", "Group")]));
        assert!(matches!(
            resolve_library(&mut library),
            Err(Error::TypeUndefined { ref name }) if name == "Group"
        ));
    }

    #[test]
    fn qualified_names_use_resolved_libraries() {
        let mut assets = Library::default();
        assets.types.insert("Order".into(), object_with(&[("id", "Id")]));
        assets.types.insert("Id".into(), APIType::with_type("integer"));
        let mut root = Library::default();
        root.uses.insert("assets".into(), Use::Inline(Box::new(assets)));
        root.types.insert("Orders".into(), APIType::with_type("assets.Order[]"));

        resolve_library(&mut root).unwrap();
        let orders = &root.types["Orders"];
        assert_eq!(orders.native_type, NativeType::Object);
        assert_eq!(orders.properties()["id"].api_type.native_type, NativeType::Integer);

        let mut body = APIType::with_type("Orders");
        fill_api_type(&mut body, &mut Snapshot(&root), false).unwrap();
        assert!(body.properties().contains_key("id"));
    }
}
