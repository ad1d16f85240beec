//! External collaborators of the loader
//!
//! The loader does not compile source text, touch the disk directly or know
//! which builtin libraries exist. Those concerns sit behind the traits in this
//! module and are handed to the loader as a [`Host`]:
//! - [`ModuleCompiler`] turns source text into a [`ModuleUnit`]
//! - [`FileSystem`] answers existence probes and reads source files
//! - [`ComponentRegistry`] supplies builtin library namespaces by identifier

use std::io;
use std::path::Path;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use url::Url;

use crate::components::BuiltinComponents;
use crate::error::LoaderError;
use crate::value::{Binding, HostNamespace, Namespace, Value};

/// Future returned to a unit's `link` for each dependency it declares.
/// Resolves to the dependency's own module unit once it is translated.
pub type DependencyFuture = LocalBoxFuture<'static, Result<Rc<dyn ModuleUnit>, LoaderError>>;

/// Outstanding work produced by a unit's `link` step
pub type PendingLink = LocalBoxFuture<'static, Result<(), LoaderError>>;

/// A compiled, linkable module.
///
/// Lifecycle: `link` once, then `instantiate`, then `evaluate`. The loader
/// calls `instantiate` on exactly one unit per connected component; an
/// implementation must bind everything reachable from that unit in one call.
pub trait ModuleUnit {
    /// Canonical URL this unit was compiled for
    fn url(&self) -> &Url;

    /// Declare static dependencies.
    ///
    /// `resolve` is called once per dependency specifier and returns a future
    /// of that dependency's unit. Any work the unit needs to finish wiring
    /// cross-module references is returned as pending futures.
    fn link(
        &self,
        resolve: &mut dyn FnMut(&str) -> DependencyFuture,
    ) -> Result<Vec<PendingLink>, LoaderError>;

    /// Bind the whole previously-linked graph reachable from this unit
    fn instantiate(&self) -> Result<(), LoaderError>;

    /// Run the module body. `None` means no meaningful result was produced.
    fn evaluate(&self) -> Result<Option<Value>, LoaderError>;

    /// Exported bindings
    fn namespace(&self) -> Result<Namespace, LoaderError>;

    /// The live binding behind one export, used to wire importers to it
    fn export_binding(&self, name: &str) -> Option<Binding>;
}

/// Turns source text into a module unit tagged with its URL
pub trait ModuleCompiler {
    fn compile(&self, source: &str, url: &Url) -> Result<Rc<dyn ModuleUnit>, LoaderError>;
}

/// Kind of filesystem entry found by [`FileSystem::stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Other,
}

/// Asynchronous filesystem access used during resolution and translation
pub trait FileSystem {
    /// Probe a path. Missing paths are reported as errors.
    fn stat<'a>(&'a self, path: &'a Path) -> LocalBoxFuture<'a, io::Result<FileKind>>;

    /// Read the full contents of a file
    fn read<'a>(&'a self, path: &'a Path) -> LocalBoxFuture<'a, io::Result<Vec<u8>>>;
}

/// [`FileSystem`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat<'a>(&'a self, path: &'a Path) -> LocalBoxFuture<'a, io::Result<FileKind>> {
        async move {
            let metadata = tokio::fs::metadata(path).await?;
            let kind = if metadata.is_file() {
                FileKind::File
            } else if metadata.is_dir() {
                FileKind::Directory
            } else {
                FileKind::Other
            };
            Ok(kind)
        }
        .boxed_local()
    }

    fn read<'a>(&'a self, path: &'a Path) -> LocalBoxFuture<'a, io::Result<Vec<u8>>> {
        tokio::fs::read(path).boxed_local()
    }
}

/// A builtin library as loaded from a component registry
#[derive(Debug, Clone)]
pub struct LoadedComponent {
    /// Current values of the library's exports
    pub namespace: HostNamespace,
    /// Names the library exports
    pub export_names: Vec<String>,
}

/// Source of builtin library namespaces
pub trait ComponentRegistry {
    /// Load a library synchronously by its internal identifier
    fn load(&self, id: &str) -> Result<LoadedComponent, LoaderError>;
}

/// The collaborators a loader runs against
#[derive(Clone)]
pub struct Host {
    pub compiler: Rc<dyn ModuleCompiler>,
    pub fs: Rc<dyn FileSystem>,
    pub components: Rc<dyn ComponentRegistry>,
}

impl Host {
    /// Host with the OS filesystem and an empty builtin registry
    pub fn new(compiler: impl ModuleCompiler + 'static) -> Self {
        Self {
            compiler: Rc::new(compiler),
            fs: Rc::new(OsFileSystem),
            components: Rc::new(BuiltinComponents::new()),
        }
    }

    pub fn with_fs(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Rc::new(fs);
        self
    }

    pub fn with_components(mut self, components: impl ComponentRegistry + 'static) -> Self {
        self.components = Rc::new(components);
        self
    }
}
