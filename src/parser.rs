//! Entry points: bytes or files in, resolved documents out.
use std::path::{Path, PathBuf};

use crate::cache::{CacheKey, DiskCache, DocumentCache};
use crate::config::ParserConfig;
use crate::decode;
use crate::document::RootDocument;
use crate::error::{Error, Result};
use crate::library::Library;
use crate::pipeline::{self, Context};
use crate::source::{FileSource, LocalFiles};

pub const RAML_VERSION: &str = "#%RAML 1.0";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub struct Parser {
    config: ParserConfig,
    source: Box<dyn FileSource>,
    cache: Option<Box<dyn DocumentCache>>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Parser {
    /// Default settings over the local filesystem.
    pub fn new() -> Self {
        Self { config: ParserConfig::default(), source: Box::new(LocalFiles), cache: None }
    }

    /// Replace the settings; a configured cache directory enables the disk cache.
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        if let Some(dir) = &config.cache_directory {
            self.cache = Some(Box::new(DiskCache::new(dir)));
        }
        self.config = config;
        self
    }

    pub fn with_source(mut self, source: impl FileSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_cache(mut self, cache: impl DocumentCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a RAML file, or every `*.raml` file of a directory concatenated
    /// in name order.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<RootDocument> {
        let path = path.as_ref();
        let (data, workdir) = if self.source.is_dir(path) {
            (load_raml_from_dir(self.source.as_ref(), path)?, path.to_path_buf())
        } else {
            let data = self.source.read(path).map_err(|e| Error::io(path, e))?;
            (data, path.parent().map(Path::to_path_buf).unwrap_or_default())
        };

        let Some(cache) = &self.cache else {
            return self.parse_data(&data, workdir);
        };
        let key = CacheKey::new(path, &data);
        match cache.load(&key) {
            Ok(Some(mut doc)) => {
                doc.working_directory = workdir;
                self.rehydrate(&mut doc)?;
                return Ok(doc);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cache lookup failed"),
        }
        let doc = self.parse_data(&data, workdir)?;
        if let Err(e) = cache.store(&key, &doc) {
            tracing::warn!(path = %path.display(), error = %e, "failed to store cache entry");
        }
        Ok(doc)
    }

    /// Parse RAML text; relative references resolve against `workdir`.
    pub fn parse_data(&self, data: &[u8], workdir: impl Into<PathBuf>) -> Result<RootDocument> {
        let mut doc = decode::root_document(&load_yaml(data, &self.config)?)?;
        doc.working_directory = workdir.into();
        let mut cx = Context::for_document(&self.config, self.source.as_ref(), &doc);
        pipeline::run(&mut cx, &mut doc, pipeline::standard_passes())?;
        tracing::info!(title = %doc.title, resources = doc.resources.len(), "parsed document");
        Ok(doc)
    }

    pub fn parse_library_file(&self, path: impl AsRef<Path>) -> Result<Library> {
        let path = path.as_ref();
        let data = self.source.read(path).map_err(|e| Error::io(path, e))?;
        self.parse_library_data(&data, path.parent().map(Path::to_path_buf).unwrap_or_default())
    }

    /// Parse a standalone library. Bodies without a media type are kept
    /// under the empty key, since only a root document declares defaults.
    pub fn parse_library_data(&self, data: &[u8], workdir: impl Into<PathBuf>) -> Result<Library> {
        let library = decode::library(&load_yaml(data, &self.config)?, "")?;
        let mut doc = RootDocument { library, working_directory: workdir.into(), ..RootDocument::default() };
        let mut cx = Context::new(&self.config, self.source.as_ref());
        pipeline::run(&mut cx, &mut doc, pipeline::standard_passes())?;
        Ok(doc.library)
    }

    fn rehydrate(&self, doc: &mut RootDocument) -> Result<()> {
        let mut cx = Context::for_document(&self.config, self.source.as_ref(), doc);
        pipeline::run(&mut cx, doc, pipeline::rehydrate_passes())
    }
}

/// Concatenate the sorted `*.raml` files of `dir`, each followed by a newline.
pub fn load_raml_from_dir(source: &dyn FileSource, dir: &Path) -> Result<Vec<u8>> {
    let files = source.list_raml(dir).map_err(|e| Error::io(dir, e))?;
    let mut data = Vec::new();
    for file in files {
        let content = source.read(&file).map_err(|e| Error::io(&file, e))?;
        data.extend_from_slice(&content);
        data.push(b'\n');
    }
    tracing::debug!(dir = %dir.display(), bytes = data.len(), "concatenated directory");
    Ok(data)
}

/// The first line must start with `#%RAML 1.0`.
pub fn check_raml_version(data: &[u8]) -> Result<()> {
    let first_line = match data.iter().position(|&b| b == b'\n') {
        Some(end) => &data[..end],
        None => data,
    };
    let head = first_line.get(..RAML_VERSION.len()).unwrap_or(first_line);
    if head == RAML_VERSION.as_bytes() {
        return Ok(());
    }
    Err(Error::UnexpectedRamlVersion { expected: RAML_VERSION, actual: String::from_utf8_lossy(head).into_owned() })
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn load_yaml(data: &[u8], config: &ParserConfig) -> Result<serde_yaml::Value> {
    if config.check_raml_version {
        check_raml_version(data)?;
    }
    serde_yaml::from_slice(data).map_err(|err| {
        let line = err.location().map(|at| at.line()).unwrap_or(0);
        let context = (config.error_trace_distance >= 0 && line > 0)
            .then(|| lines_in_range(&String::from_utf8_lossy(data), line, config.error_trace_distance));
        Error::Yaml { message: err.to_string(), line, context }
    })
}

/// Lines `line - distance ..= line + distance` (1-based `line`), clamped.
fn lines_in_range(text: &str, line: usize, distance: i64) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let line = line as i64;
    let max = (line + distance).min(lines.len() as i64).max(0) as usize;
    let min = ((line - distance - 1).max(0) as usize).min(max);
    lines[min..max].join("\n")
}
