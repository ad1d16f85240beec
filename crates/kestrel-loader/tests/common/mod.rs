//! Shared fixtures for loader integration tests
//!
//! `FakeCompiler` understands a line-based toy format:
//!
//! ```text
//! import ./b          declare a dependency
//! value 7             evaluation result
//! export answer 42    exported binding with an initial value
//! fail-instantiate    instantiate fails
//! fail-evaluate       evaluate fails
//! ```
//!
//! and counts instantiate/evaluate calls per URL. `FakeFs` is an in-memory
//! filesystem rooted at `/project` that records how many probes are in
//! flight at once.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, TryFutureExt};
use kestrel_loader::{
    Binding, DependencyFuture, FileKind, FileSystem, Host, Loader, LoaderConfig, LoaderError,
    ModuleCompiler, ModuleUnit, Namespace, PendingLink, Value,
};
use url::Url;

pub const ROOT: &str = "/project";

/// Run a future on a current-thread runtime inside a `LocalSet`
pub fn block_on<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    tokio::task::LocalSet::new().block_on(&runtime, future)
}

pub fn file_url(relative: &str) -> Url {
    Url::from_file_path(Path::new(ROOT).join(relative)).unwrap()
}

#[derive(Default)]
pub struct Counters {
    instantiate: RefCell<HashMap<Url, usize>>,
    evaluate: RefCell<HashMap<Url, usize>>,
}

impl Counters {
    pub fn instantiations(&self, url: &Url) -> usize {
        self.instantiate.borrow().get(url).copied().unwrap_or(0)
    }

    pub fn total_instantiations(&self) -> usize {
        self.instantiate.borrow().values().sum()
    }

    pub fn evaluations(&self, url: &Url) -> usize {
        self.evaluate.borrow().get(url).copied().unwrap_or(0)
    }

    fn bump(map: &RefCell<HashMap<Url, usize>>, url: &Url) {
        *map.borrow_mut().entry(url.clone()).or_insert(0) += 1;
    }
}

pub struct FakeUnit {
    url: Url,
    imports: Vec<String>,
    value: Option<f64>,
    exports: BTreeMap<String, Binding>,
    fail_instantiate: bool,
    fail_evaluate: bool,
    counters: Rc<Counters>,
}

impl ModuleUnit for FakeUnit {
    fn url(&self) -> &Url {
        &self.url
    }

    fn link(
        &self,
        resolve: &mut dyn FnMut(&str) -> DependencyFuture,
    ) -> Result<Vec<PendingLink>, LoaderError> {
        Ok(self
            .imports
            .iter()
            .map(|specifier| resolve(specifier.as_str()).map_ok(|_| ()).boxed_local())
            .collect())
    }

    fn instantiate(&self) -> Result<(), LoaderError> {
        Counters::bump(&self.counters.instantiate, &self.url);
        if self.fail_instantiate {
            return Err(LoaderError::Instantiate {
                url: self.url.clone(),
                message: "instantiation failed".to_string(),
            });
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Option<Value>, LoaderError> {
        Counters::bump(&self.counters.evaluate, &self.url);
        if self.fail_evaluate {
            return Err(LoaderError::Evaluate {
                url: self.url.clone(),
                message: "evaluation failed".to_string(),
            });
        }
        Ok(self.value.map(Value::Number))
    }

    fn namespace(&self) -> Result<Namespace, LoaderError> {
        Ok(Namespace::new(self.exports.clone()))
    }

    fn export_binding(&self, name: &str) -> Option<Binding> {
        self.exports.get(name).cloned()
    }
}

#[derive(Clone, Default)]
pub struct FakeCompiler {
    pub counters: Rc<Counters>,
}

impl ModuleCompiler for FakeCompiler {
    fn compile(&self, source: &str, url: &Url) -> Result<Rc<dyn ModuleUnit>, LoaderError> {
        let mut unit = FakeUnit {
            url: url.clone(),
            imports: Vec::new(),
            value: None,
            exports: BTreeMap::new(),
            fail_instantiate: false,
            fail_evaluate: false,
            counters: self.counters.clone(),
        };

        for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["import", specifier] => unit.imports.push(specifier.to_string()),
                ["value", n] => unit.value = n.parse().ok(),
                ["export", name, n] => {
                    let value = n.parse().map(Value::Number).unwrap_or_default();
                    unit.exports.insert(name.to_string(), Binding::new(value));
                }
                ["fail-instantiate"] => unit.fail_instantiate = true,
                ["fail-evaluate"] => unit.fail_evaluate = true,
                _ => {
                    return Err(LoaderError::Compile {
                        url: url.clone(),
                        message: format!("unexpected line '{}'", line),
                    })
                }
            }
        }

        Ok(Rc::new(unit))
    }
}

/// In-memory filesystem
#[derive(Clone, Default)]
pub struct FakeFs {
    files: Rc<RefCell<HashMap<PathBuf, String>>>,
    dirs: Rc<RefCell<HashSet<PathBuf>>>,
    in_flight: Rc<Cell<usize>>,
    max_in_flight: Rc<Cell<usize>>,
    stats: Rc<Cell<usize>>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file relative to `/project`
    pub fn file(self, relative: &str, contents: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(Path::new(ROOT).join(relative), contents.to_string());
        self
    }

    pub fn dir(self, relative: &str) -> Self {
        self.dirs.borrow_mut().insert(Path::new(ROOT).join(relative));
        self
    }

    /// Highest number of probes observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    pub fn stat_calls(&self) -> usize {
        self.stats.get()
    }
}

impl FileSystem for FakeFs {
    fn stat<'a>(&'a self, path: &'a Path) -> LocalBoxFuture<'a, io::Result<FileKind>> {
        async move {
            self.stats.set(self.stats.get() + 1);
            self.in_flight.set(self.in_flight.get() + 1);
            self.max_in_flight
                .set(self.max_in_flight.get().max(self.in_flight.get()));

            // Let other probes start so overlap is observable
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;

            self.in_flight.set(self.in_flight.get() - 1);

            if self.files.borrow().contains_key(path) {
                Ok(FileKind::File)
            } else if self.dirs.borrow().contains(path) {
                Ok(FileKind::Directory)
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
            }
        }
        .boxed_local()
    }

    fn read<'a>(&'a self, path: &'a Path) -> LocalBoxFuture<'a, io::Result<Vec<u8>>> {
        async move {
            self.files
                .borrow()
                .get(path)
                .map(|s| s.clone().into_bytes())
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
        .boxed_local()
    }
}

pub fn config() -> LoaderConfig {
    LoaderConfig {
        cwd: Some(PathBuf::from(ROOT)),
        ..LoaderConfig::default()
    }
}

/// Loader over a fake filesystem, returning the compiler for its counters
pub fn loader(fs: FakeFs) -> (Loader, FakeCompiler) {
    loader_with(fs, config(), |host| host)
}

pub fn loader_with(
    fs: FakeFs,
    config: LoaderConfig,
    customize: impl FnOnce(Host) -> Host,
) -> (Loader, FakeCompiler) {
    let compiler = FakeCompiler::default();
    let host = customize(Host::new(compiler.clone()).with_fs(fs));
    let loader = Loader::new(&config, host).unwrap();
    (loader, compiler)
}
