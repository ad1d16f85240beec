//! Kestrel module loader
//!
//! Resolves import specifiers to canonical URLs, builds the module graph,
//! links it, instantiates each connected component exactly once and
//! evaluates modules on demand.
//!
//! # Architecture
//!
//! - [`Loader`]: resolve, get-or-create jobs in the module map, import
//! - [`ModuleJob`]: the link → instantiate → evaluate lifecycle of one module
//! - [`ComponentInstantiation`]: once-flag shared by a connected component
//! - [`TranslatorRegistry`]: one translator per [`Format`]
//! - [`create_dynamic_module`]: bridges host namespaces into modules
//!
//! Compilation, filesystem access and builtin libraries are supplied by the
//! embedder through [`Host`].
//!
//! # Example
//!
//! ```ignore
//! let host = Host::new(compiler).with_components(
//!     BuiltinComponents::new().with("math", math_namespace),
//! );
//! let loader = Loader::new(&LoaderConfig::default(), host)?;
//!
//! let local = tokio::task::LocalSet::new();
//! let namespace = local.run_until(loader.import("./main", None)).await?;
//! ```

pub mod components;
pub mod config;
pub mod dynamic_module;
pub mod error;
pub mod host;
pub mod instantiation;
pub mod job;
pub mod loader;
pub mod module_map;
pub mod resolver;
pub mod source;
pub mod translators;
pub mod value;

pub use components::BuiltinComponents;
pub use config::LoaderConfig;
pub use dynamic_module::{create_dynamic_module, Executor, Reflection, SyntheticUnit};
pub use error::{ConfigError, LoaderError};
pub use host::{
    ComponentRegistry, DependencyFuture, FileKind, FileSystem, Host, LoadedComponent,
    ModuleCompiler, ModuleUnit, OsFileSystem, PendingLink,
};
pub use instantiation::ComponentInstantiation;
pub use job::{Completion, ModuleJob};
pub use loader::Loader;
pub use module_map::{CacheStats, JobId};
pub use resolver::{eval_url, repl_url, ResolvedModule};
pub use translators::{Format, Translation, TranslatorRegistry};
pub use value::{Binding, HostNamespace, Namespace, NativeFunction, Value};
