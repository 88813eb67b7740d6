//! Parser settings.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::check::CheckValueOptions;
use crate::error::{Error, Result};
use crate::path_de::from_slice_with_path;

/// Lines of source shown around a YAML syntax error by default.
pub const DEFAULT_ERROR_TRACE_DISTANCE: i64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Require the first line to start with `#%RAML 1.0`.
    pub check_raml_version: bool,
    /// Options used when examples are validated.
    pub check_value_options: CheckValueOptions,
    pub ignore_unused_annotation: bool,
    pub ignore_unused_trait: bool,
    /// Directory for resolved documents keyed by path and content hash.
    pub cache_directory: Option<PathBuf>,
    /// Negative disables the source excerpt in YAML errors.
    pub error_trace_distance: i64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            check_raml_version: false,
            check_value_options: CheckValueOptions::default(),
            ignore_unused_annotation: false,
            ignore_unused_trait: false,
            cache_directory: None,
            error_trace_distance: DEFAULT_ERROR_TRACE_DISTANCE,
        }
    }
}

impl ParserConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        from_slice_with_path(bytes)
    }

    pub fn check_raml_version(mut self, check: bool) -> Self {
        self.check_raml_version = check;
        self
    }
    pub fn check_value_options(mut self, options: CheckValueOptions) -> Self {
        self.check_value_options = options;
        self
    }
    pub fn ignore_unused_annotation(mut self, ignore: bool) -> Self {
        self.ignore_unused_annotation = ignore;
        self
    }
    pub fn ignore_unused_trait(mut self, ignore: bool) -> Self {
        self.ignore_unused_trait = ignore;
        self
    }
    pub fn cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }
    pub fn error_trace_distance(mut self, distance: i64) -> Self {
        self.error_trace_distance = distance;
        self
    }
}
