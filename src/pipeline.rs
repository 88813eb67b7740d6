//! The resolution pipeline: ordered passes over the whole document tree.
//!
//! Each pass is a visitor with no-op hooks. The shared walker drives it
//! over the tree and keeps the library scope current; a pass completes over
//! the entire tree before the next one starts.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::annotation::{AnnotationTypes, Annotations, TargetLocation};
use crate::config::ParserConfig;
use crate::document::{Bodies, Method, Resource, RootDocument};
use crate::error::Result;
use crate::library::{Library, Trait, Use};
use crate::source::FileSource;
use crate::types::{APIType, Properties};

pub(crate) mod passes;
pub(crate) mod resolve;
mod walk;

// ————————————————————————————————————————————————————————————————————————————
// CONTEXT
// ————————————————————————————————————————————————————————————————————————————

/// The library a node is declared in.
pub(crate) struct Scope {
    /// Namespace of the library as seen from the root, e.g. `"assets."`.
    pub prefix: String,
    /// Snapshot taken when the walker entered the library.
    pub library: Library,
    /// Directory relative paths inside the library resolve against.
    pub directory: PathBuf,
}

/// Everything a pass may consult or record while the tree is walked.
pub(crate) struct Context<'a> {
    pub config: &'a ParserConfig,
    pub source: &'a dyn FileSource,
    /// `None` when a standalone library is processed.
    pub default_media_types: Option<Vec<String>>,
    /// Where annotations at the root of the walked tree are applied.
    pub root_target: TargetLocation,
    pub annotation_usage: BTreeSet<String>,
    pub trait_usage: BTreeSet<String>,
    root: Scope,
    nested: Vec<Scope>,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a ParserConfig, source: &'a dyn FileSource) -> Self {
        Self {
            config,
            source,
            default_media_types: None,
            root_target: TargetLocation::Library,
            annotation_usage: BTreeSet::new(),
            trait_usage: BTreeSet::new(),
            root: Scope { prefix: String::new(), library: Library::default(), directory: PathBuf::new() },
            nested: Vec::new(),
        }
    }

    pub fn for_document(config: &'a ParserConfig, source: &'a dyn FileSource, doc: &RootDocument) -> Self {
        let mut cx = Self::new(config, source);
        cx.default_media_types = Some(doc.media_type.clone());
        cx.root_target = TargetLocation::API;
        cx
    }

    fn scope(&self) -> &Scope {
        self.nested.last().unwrap_or(&self.root)
    }

    pub fn library(&self) -> &Library {
        &self.scope().library
    }

    pub fn prefix(&self) -> &str {
        &self.scope().prefix
    }

    pub fn directory(&self) -> &Path {
        &self.scope().directory
    }

    fn enter_root(&mut self, doc: &RootDocument) {
        self.root = Scope {
            prefix: String::new(),
            library: doc.library.clone(),
            directory: doc.working_directory.clone(),
        };
        self.nested.clear();
    }

    fn enter(&mut self, namespace: &str, library: &Library) {
        let prefix = format!("{}{namespace}.", self.prefix());
        let directory = library.location.clone().unwrap_or_else(|| self.directory().to_path_buf());
        self.nested.push(Scope { prefix, library: library.clone(), directory });
    }

    fn leave(&mut self) {
        self.nested.pop();
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PASSES
// ————————————————————————————————————————————————————————————————————————————

/// A visitor run over the whole tree. Every hook defaults to doing nothing.
pub(crate) trait Pass {
    fn name(&self) -> &'static str;

    /// Before the walk, with the whole document at hand.
    fn prepare(&mut self, _cx: &mut Context<'_>, _doc: &mut RootDocument) -> Result<()> {
        Ok(())
    }
    fn library(&mut self, _cx: &mut Context<'_>, _library: &mut Library) -> Result<()> {
        Ok(())
    }
    /// An entry of `uses`, before the walker descends into it.
    fn use_entry(&mut self, _cx: &mut Context<'_>, _namespace: &str, _entry: &mut Use) -> Result<()> {
        Ok(())
    }
    fn api_type(&mut self, _cx: &mut Context<'_>, _api: &mut APIType) -> Result<()> {
        Ok(())
    }
    fn properties(&mut self, _cx: &mut Context<'_>, _properties: &mut Properties) -> Result<()> {
        Ok(())
    }
    fn annotations(
        &mut self,
        _cx: &mut Context<'_>,
        _annotations: &mut Annotations,
        _targets: &[TargetLocation],
    ) -> Result<()> {
        Ok(())
    }
    fn annotation_types(&mut self, _cx: &mut Context<'_>, _types: &mut AnnotationTypes) -> Result<()> {
        Ok(())
    }
    /// Trait declarations and `is:` usages alike.
    fn trait_node(&mut self, _cx: &mut Context<'_>, _node: &mut Trait) -> Result<()> {
        Ok(())
    }
    fn resource(&mut self, _cx: &mut Context<'_>, _key: &str, _resource: &mut Resource) -> Result<()> {
        Ok(())
    }
    fn method(&mut self, _cx: &mut Context<'_>, _method: &mut Method) -> Result<()> {
        Ok(())
    }
    fn bodies(&mut self, _cx: &mut Context<'_>, _bodies: &mut Bodies) -> Result<()> {
        Ok(())
    }
    /// After the walk.
    fn finish(&mut self, _cx: &mut Context<'_>) -> Result<()> {
        Ok(())
    }
}

/// Run `passes` in order over `doc`.
pub(crate) fn run(cx: &mut Context<'_>, doc: &mut RootDocument, passes: Vec<Box<dyn Pass>>) -> Result<()> {
    for mut pass in passes {
        tracing::debug!(pass = pass.name(), "running pass");
        pass.prepare(cx, doc)?;
        cx.enter_root(doc);
        walk::root(pass.as_mut(), cx, doc)?;
        pass.finish(cx)?;
    }
    Ok(())
}

/// Every pass of a parse, in order.
pub(crate) fn standard_passes() -> Vec<Box<dyn Pass>> {
    use passes::*;
    vec![
        Box::new(LoadExternalUse),
        Box::new(FixRequiredBySyntax),
        Box::new(FixDefaultMediaType),
        Box::new(FixEmptyAnnotation),
        Box::new(FixAnnotationBracket),
        Box::new(FillProperties),
        Box::new(FillTrait),
        Box::new(FillUriParams),
        Box::new(FillExample),
        Box::new(CheckTypo),
        Box::new(CheckUnusedAnnotation),
        Box::new(AfterCheckUnusedAnnotation),
        Box::new(CheckUnusedTrait),
        Box::new(AfterCheckUnusedTrait),
        Box::new(CheckExample),
    ]
}

/// Restore what serialization drops from a cached document.
pub(crate) fn rehydrate_passes() -> Vec<Box<dyn Pass>> {
    vec![Box::new(passes::Rehydrate)]
}
