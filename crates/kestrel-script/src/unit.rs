//! Script module units
//!
//! A [`ScriptUnit`] owns one export cell per exported name from the moment
//! it is compiled, so importers can be wired to it before it runs.
//!
//! # Lifecycle
//! - `link`: asks the loader for each distinct import specifier and keeps a
//!   weak handle to every dependency unit
//! - `instantiate`: recursively instantiates dependencies, then binds every
//!   imported name to the exporter's cell. Safe on cycles: a unit that is
//!   already instantiating is skipped.
//! - `evaluate`: evaluates dependencies first, then the body, once. The
//!   outcome (value or error) is replayed on later calls.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::FutureExt;
use kestrel_loader::{
    Binding, DependencyFuture, LoaderError, ModuleUnit, Namespace, PendingLink, Value,
};
use url::Url;

use crate::ast::{Module, Statement};
use crate::error::ScriptError;
use crate::interp::{self, Environment};

type Dependencies = Rc<RefCell<HashMap<String, Weak<dyn ModuleUnit>>>>;

#[derive(Debug, Clone)]
pub enum Status {
    Unlinked,
    Linked,
    Instantiating,
    Instantiated,
    Evaluating,
    Evaluated(Option<Value>),
    Errored(LoaderError),
}

pub struct ScriptUnit {
    url: Url,
    module: Module,
    /// Every `let` declaration, exported or not
    locals: HashMap<String, Binding>,
    /// Exported name → cell, aliasing `locals`
    exports: BTreeMap<String, Binding>,
    /// Bound during instantiation
    imports: RefCell<HashMap<String, Binding>>,
    /// Specifier → dependency unit, filled in by the link phase
    dependencies: Dependencies,
    status: RefCell<Status>,
}

impl ScriptUnit {
    /// Build a unit from a parsed module, checking its declarations
    pub fn new(module: Module, url: &Url) -> Result<Self, ScriptError> {
        let mut declared = HashSet::new();
        let mut imported = HashSet::new();
        let mut locals = HashMap::new();
        let mut exports = BTreeMap::new();

        for statement in &module.statements {
            match statement {
                Statement::Import(decl) => {
                    for binding in &decl.bindings {
                        if !declared.insert(binding.local.clone()) {
                            return Err(ScriptError::Duplicate(binding.local.clone()));
                        }
                        imported.insert(binding.local.clone());
                    }
                }
                Statement::Let { name, exported, .. } => {
                    if !declared.insert(name.clone()) {
                        return Err(ScriptError::Duplicate(name.clone()));
                    }
                    let binding = Binding::default();
                    if *exported {
                        exports.insert(name.clone(), binding.clone());
                    }
                    locals.insert(name.clone(), binding);
                }
                _ => {}
            }
        }

        for statement in &module.statements {
            let Statement::ExportList(specifiers) = statement else {
                continue;
            };
            for spec in specifiers {
                let binding = match locals.get(&spec.local) {
                    Some(binding) => binding.clone(),
                    None => {
                        let message = if imported.contains(&spec.local) {
                            format!("cannot re-export imported binding '{}'", spec.local)
                        } else {
                            format!("'{}' is not declared", spec.local)
                        };
                        return Err(ScriptError::Parse {
                            line: spec.span.line,
                            column: spec.span.column,
                            message,
                        });
                    }
                };
                if exports.insert(spec.exported.clone(), binding).is_some() {
                    return Err(ScriptError::Duplicate(spec.exported.clone()));
                }
            }
        }

        Ok(Self {
            url: url.clone(),
            module,
            locals,
            exports,
            imports: RefCell::new(HashMap::new()),
            dependencies: Rc::new(RefCell::new(HashMap::new())),
            status: RefCell::new(Status::Unlinked),
        })
    }

    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    fn set_status(&self, status: Status) {
        *self.status.borrow_mut() = status;
    }

    /// Distinct import specifiers in source order
    fn specifiers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.module
            .imports()
            .map(|decl| decl.specifier.as_str())
            .filter(|specifier| seen.insert(*specifier))
            .collect()
    }

    fn dependency(&self, specifier: &str) -> Result<Rc<dyn ModuleUnit>, LoaderError> {
        let weak = self.dependencies.borrow().get(specifier).cloned();
        match weak {
            Some(weak) => weak.upgrade().ok_or_else(|| LoaderError::Link {
                url: self.url.clone(),
                message: format!("dependency '{}' is no longer loaded", specifier),
            }),
            None => Err(LoaderError::Instantiate {
                url: self.url.clone(),
                message: format!("dependency '{}' has not been linked", specifier),
            }),
        }
    }

    fn instantiate_graph(&self) -> Result<(), LoaderError> {
        for specifier in self.specifiers() {
            self.dependency(specifier)?.instantiate()?;
        }

        let mut imports = self.imports.borrow_mut();
        for decl in self.module.imports() {
            let dependency = self.dependency(&decl.specifier)?;
            for binding in &decl.bindings {
                let cell = dependency.export_binding(&binding.imported).ok_or_else(|| {
                    LoaderError::UnknownExport {
                        url: dependency.url().clone(),
                        name: binding.imported.clone(),
                    }
                })?;
                imports.insert(binding.local.clone(), cell);
            }
        }

        Ok(())
    }

    fn evaluate_body(&self) -> Result<Option<Value>, LoaderError> {
        for specifier in self.specifiers() {
            self.dependency(specifier)?.evaluate()?;
        }

        log::trace!("running body of {}", self.url);
        let imports = self.imports.borrow();
        let env = Environment {
            locals: &self.locals,
            imports: &imports,
        };
        interp::run(&self.module, &env).map_err(|e| e.into_evaluate_error(&self.url))
    }
}

impl ModuleUnit for ScriptUnit {
    fn url(&self) -> &Url {
        &self.url
    }

    fn link(
        &self,
        resolve: &mut dyn FnMut(&str) -> DependencyFuture,
    ) -> Result<Vec<PendingLink>, LoaderError> {
        let mut pending = Vec::new();

        for specifier in self.specifiers() {
            let dependency = resolve(specifier);
            let dependencies = self.dependencies.clone();
            let specifier = specifier.to_string();

            pending.push(
                async move {
                    let unit = dependency.await?;
                    dependencies
                        .borrow_mut()
                        .insert(specifier, Rc::downgrade(&unit));
                    Ok(())
                }
                .boxed_local(),
            );
        }

        self.set_status(Status::Linked);
        Ok(pending)
    }

    fn instantiate(&self) -> Result<(), LoaderError> {
        match self.status() {
            Status::Linked => {}
            Status::Unlinked => {
                return Err(LoaderError::Instantiate {
                    url: self.url.clone(),
                    message: "module has not been linked".to_string(),
                })
            }
            Status::Errored(e) => return Err(e),
            // Already instantiated, or on the current instantiation path
            _ => return Ok(()),
        }

        self.set_status(Status::Instantiating);
        match self.instantiate_graph() {
            Ok(()) => {
                self.set_status(Status::Instantiated);
                Ok(())
            }
            Err(e) => {
                self.set_status(Status::Errored(e.clone()));
                Err(e)
            }
        }
    }

    fn evaluate(&self) -> Result<Option<Value>, LoaderError> {
        match self.status() {
            Status::Instantiated => {}
            Status::Evaluated(result) => return Ok(result),
            Status::Errored(e) => return Err(e),
            // Cycle: the module is already running further up the stack
            Status::Evaluating => return Ok(None),
            Status::Unlinked | Status::Linked | Status::Instantiating => {
                return Err(LoaderError::Evaluate {
                    url: self.url.clone(),
                    message: "module has not been instantiated".to_string(),
                })
            }
        }

        self.set_status(Status::Evaluating);
        match self.evaluate_body() {
            Ok(result) => {
                self.set_status(Status::Evaluated(result.clone()));
                Ok(result)
            }
            Err(e) => {
                self.set_status(Status::Errored(e.clone()));
                Err(e)
            }
        }
    }

    fn namespace(&self) -> Result<Namespace, LoaderError> {
        Ok(Namespace::new(self.exports.clone()))
    }

    fn export_binding(&self, name: &str) -> Option<Binding> {
        self.exports.get(name).cloned()
    }
}

impl fmt::Debug for ScriptUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptUnit")
            .field("url", &self.url.as_str())
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .field("status", &self.status.borrow())
            .finish()
    }
}
