//! Error taxonomy for decoding, resolution and value validation.
use std::path::PathBuf;

use crate::value::ValueKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // source and syntax
    #[error("RAML version should be {expected:?} but got {actual:?}")]
    UnexpectedRamlVersion { expected: &'static str, actual: String },

    #[error("yaml: line {line}: {message}{}", format_trace(.context))]
    Yaml { message: String, line: usize, context: Option<String> },

    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to load library {}: {source}", .path.display())]
    LibraryLoad { path: PathBuf, source: Box<Error> },

    // decoding
    #[error("at {path}: expected {expected}, found {found}")]
    WrongShape { path: String, expected: &'static str, found: &'static str },

    #[error("at {path}: {message}")]
    Decode { path: String, message: String },

    #[error("at {path}: invalid annotation target location {name:?}")]
    InvalidTargetLocation { path: String, name: String },

    // resolution
    #[error("type {name:?} is not defined")]
    TypeUndefined { name: String },

    #[error("type {name:?} inherits from itself: {}", .chain.join(" -> "))]
    CyclicType { name: String, chain: Vec<String> },

    #[error("trait {name:?} is not defined")]
    TraitUndefined { name: String },

    #[error("annotation type {name:?} is not defined")]
    AnnotationUndefined { name: String },

    #[error("library {name:?} is not defined")]
    LibraryUndefined { name: String },

    #[error("annotation {name:?} is not allowed on {target}")]
    AnnotationTargetNotAllowed { name: String, target: String },

    #[error("body without media type but the document declares no default mediaType")]
    MissingDefaultMediaType,

    #[error("unexpected key {key:?} in {node}, possibly a typo")]
    Typo { key: String, node: String },

    #[error("unused annotation types: {}", .names.join(", "))]
    UnusedAnnotation { names: Vec<String> },

    #[error("unused traits: {}", .names.join(", "))]
    UnusedTrait { names: Vec<String> },

    #[error("property {name:?} is declared more than once")]
    DuplicateProperty { name: String },

    // value validation
    #[error("{}type mismatch: expected {expected:?} but got {actual}", format_property(.property))]
    PropertyTypeMismatch { property: Option<String>, expected: String, actual: ValueKind },

    #[error("property {property:?} type mismatch: {source}")]
    PropertyMismatch { property: String, source: Box<Error> },

    #[error("array element [{index}] type mismatch: expected {expected:?} but got {actual}")]
    ArrayElementTypeMismatch { index: usize, expected: String, actual: ValueKind },

    #[error("property {property:?} is required by type {owner:?}")]
    RequiredProperty { property: String, owner: String },

    // cache and config
    #[error("cache: {message}")]
    Cache { message: String },

    #[error("invalid config{}: {message}", format_property(.path))]
    Config { path: Option<String>, message: String },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Error {
    pub(crate) fn decode(path: &str, message: impl std::fmt::Display) -> Self {
        Error::Decode { path: path.to_string(), message: message.to_string() }
    }
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn format_trace(context: &Option<String>) -> String {
    match context {
        Some(lines) => format!("\n{lines}"),
        None => String::new(),
    }
}

fn format_property(property: &Option<String>) -> String {
    match property {
        Some(name) => format!("property {name:?} "),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_mismatch_keeps_its_cause() {
        let inner = Error::ArrayElementTypeMismatch {
            index: 2,
            expected: "string".into(),
            actual: ValueKind::Integer,
        };
        let outer = Error::PropertyMismatch { property: "tags".into(), source: Box::new(inner) };
        let source = std::error::Error::source(&outer).expect("wrapped cause");
        assert!(source.to_string().contains("[2]"), "cause names the element index");
        assert!(outer.to_string().starts_with("property \"tags\""));
    }

    #[test]
    fn yaml_error_renders_trace_only_when_present() {
        let plain = Error::Yaml { message: "bad".into(), line: 3, context: None };
        assert_eq!(plain.to_string(), "yaml: line 3: bad");
        let traced = Error::Yaml { message: "bad".into(), line: 3, context: Some("a: [".into()) };
        assert!(traced.to_string().ends_with("\na: ["));
    }
}
