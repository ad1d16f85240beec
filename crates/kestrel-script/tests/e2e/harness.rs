//! Test harness: a project directory on disk and a loader over it

#![allow(dead_code)]

use std::fs;
use std::future::Future;
use std::path::Path;

use kestrel_loader::{
    BuiltinComponents, Completion, HostNamespace, Host, Loader, LoaderConfig, LoaderError,
    Namespace, Value,
};
use kestrel_script::ScriptCompiler;
use tempfile::TempDir;

/// Error type for harness helpers
#[derive(Debug)]
pub enum E2EError {
    Loader(LoaderError),
    NoValue,
}

impl std::fmt::Display for E2EError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            E2EError::Loader(e) => write!(f, "Loader error: {}", e),
            E2EError::NoValue => write!(f, "Module produced no value"),
        }
    }
}

impl From<LoaderError> for E2EError {
    fn from(e: LoaderError) -> Self {
        E2EError::Loader(e)
    }
}

/// A temporary project directory plus a loader rooted at it
pub struct Project {
    dir: TempDir,
    pub loader: Loader,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = LoaderConfig {
            cwd: Some(dir.path().to_path_buf()),
            ..LoaderConfig::default()
        };
        let host = Host::new(ScriptCompiler::new()).with_components(components());
        let loader = Loader::new(&config, host).unwrap();
        Self { dir, loader }
    }

    /// Write a file relative to the project root
    pub fn file(self, relative: &str, source: &str) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Run a module and return its evaluation result
    pub fn run(&self, specifier: &str) -> Result<Value, E2EError> {
        block_on(async {
            let job = self.loader.get_module_job(specifier, None).await?;
            match job.run().await? {
                Completion::Value(value) => Ok(value),
                Completion::Empty => Err(E2EError::NoValue),
            }
        })
    }

    /// Import a module and return its namespace
    pub fn import(&self, specifier: &str) -> Result<Namespace, E2EError> {
        block_on(async { Ok(self.loader.import(specifier, None).await?) })
    }

    pub fn eval(&self, source: &str) -> Result<Completion, E2EError> {
        block_on(async { Ok(self.loader.eval(source).await?) })
    }
}

/// Builtin libraries available to every project
fn components() -> BuiltinComponents {
    BuiltinComponents::new()
        .with(
            "math",
            HostNamespace::new()
                .with(
                    "double",
                    Value::function("double", |args| match args {
                        [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
                        _ => Err("expected one number".to_string()),
                    }),
                )
                .with("pi", Value::Number(3.5)),
        )
        .with(
            "text",
            HostNamespace::new().with(
                "upper",
                Value::function("upper", |args| match args {
                    [Value::String(s)] => Ok(Value::string(&s.to_uppercase())),
                    _ => Err("expected one string".to_string()),
                }),
            ),
        )
}

/// Run a future on a current-thread runtime inside a `LocalSet`
pub fn block_on<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    tokio::task::LocalSet::new().block_on(&runtime, future)
}

pub fn expect_number(result: Result<Value, E2EError>, expected: f64) {
    match result {
        Ok(Value::Number(n)) => assert_eq!(n, expected),
        Ok(other) => panic!("Expected number {}, got {:?}", expected, other),
        Err(e) => panic!("Expected number {}, got error: {}", expected, e),
    }
}

pub fn expect_string(result: Result<Value, E2EError>, expected: &str) {
    match result {
        Ok(Value::String(s)) => assert_eq!(&*s, expected),
        Ok(other) => panic!("Expected string {:?}, got {:?}", expected, other),
        Err(e) => panic!("Expected string {:?}, got error: {}", expected, e),
    }
}

pub fn expect_loader_error(result: Result<Value, E2EError>) -> LoaderError {
    match result {
        Err(E2EError::Loader(e)) => e,
        Err(other) => panic!("Expected loader error, got {}", other),
        Ok(value) => panic!("Expected loader error, got {:?}", value),
    }
}
