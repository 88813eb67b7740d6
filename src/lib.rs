//! RAML 1.0 parsing, type resolution, example generation and value checking.
//!
//! ```no_run
//! let doc = raml_parser::Parser::new().parse_file("api.raml")?;
//! let user = doc.library.get_type("User").expect("declared");
//! let value = raml_parser::Value::from(serde_json::json!({"name": "Alice"}));
//! raml_parser::check_value_api_type(user, &value, &Default::default())?;
//! # Ok::<(), raml_parser::Error>(())
//! ```
pub mod annotation;
pub mod cache;
pub mod check;
pub mod config;
pub mod document;
pub mod error;
pub mod example;
pub mod library;
pub mod merge;
pub mod parser;
pub mod source;
pub mod types;
pub mod value;

mod decode;
mod path_de;
mod pipeline;

pub use annotation::{Annotation, AnnotationType, TargetLocation};
pub use cache::{CacheKey, DiskCache, DocumentCache};
pub use check::{CheckValueOptions, check_value_api_type};
pub use config::ParserConfig;
pub use document::{Method, Resource, Response, RootDocument};
pub use error::{Error, Result};
pub use example::{AUTO_GENERATED, Example};
pub use library::{Library, Trait, Use};
pub use parser::{Parser, check_raml_version, load_raml_from_dir};
pub use source::{FileSource, LocalFiles, MemoryFiles};
pub use types::{APIType, NativeType, Properties, Property};
pub use value::{Value, ValueKind};
