//! Dynamic Module Bridge
//!
//! Exposes an arbitrary host name → value table as a module with live,
//! re-exported bindings, without asking the compiler for any notion of
//! synthetic modules.
//!
//! A bridge is made of two halves that share one set of cells:
//! - the *reflective* half, [`Reflection`]: one mutable cell per export plus
//!   an executor slot, with direct get/set accessors for the host
//! - the *facade*, [`SyntheticUnit`]: a [`ModuleUnit`] that re-exports those
//!   cells under their original names and runs the executor while it
//!   evaluates
//!
//! The facade is linked to its cells directly at construction. Ordinary
//! import specifiers can never reach the reflective half.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::error::LoaderError;
use crate::host::{DependencyFuture, ModuleUnit, PendingLink};
use crate::value::{Binding, Namespace, Value};

/// Callback run once, when the facade evaluates
pub type Executor = Box<dyn FnOnce(&Reflection) -> Result<(), LoaderError>>;

struct ReflectiveCells {
    url: Url,
    bindings: BTreeMap<String, Binding>,
    executor: RefCell<Option<Executor>>,
}

/// Accessor bundle of a dynamic module's reflective half
#[derive(Clone)]
pub struct Reflection {
    cells: Rc<ReflectiveCells>,
}

impl Reflection {
    /// Install the callback the facade runs during its evaluation,
    /// replacing any earlier one that has not run yet.
    pub fn set_executor<F>(&self, executor: F)
    where
        F: FnOnce(&Reflection) -> Result<(), LoaderError> + 'static,
    {
        *self.cells.executor.borrow_mut() = Some(Box::new(executor));
    }

    /// Current value of an export
    pub fn get(&self, name: &str) -> Result<Value, LoaderError> {
        self.binding(name).map(Binding::get)
    }

    /// Write an export; every importer observes the new value
    pub fn set(&self, name: &str, value: Value) -> Result<(), LoaderError> {
        self.binding(name)?.set(value);
        Ok(())
    }

    /// Export names, sorted
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.cells.bindings.keys().map(String::as_str)
    }

    pub fn url(&self) -> &Url {
        &self.cells.url
    }

    fn binding(&self, name: &str) -> Result<&Binding, LoaderError> {
        self.cells
            .bindings
            .get(name)
            .ok_or_else(|| LoaderError::UnknownExport {
                url: self.cells.url.clone(),
                name: name.to_string(),
            })
    }
}

impl fmt::Debug for Reflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflection")
            .field("url", &self.cells.url.as_str())
            .field("exports", &self.cells.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Facade state
#[derive(Debug, Clone)]
pub enum SyntheticState {
    /// Created, cells wired
    Linked,
    /// Instantiated as part of a component
    Instantiated,
    /// Executor is running
    Evaluating,
    /// Executor has run
    Evaluated,
    /// Executor failed; replayed on every later evaluation
    Errored(LoaderError),
}

/// The facade half: a module unit re-exporting the reflective cells
pub struct SyntheticUnit {
    cells: Rc<ReflectiveCells>,
    state: RefCell<SyntheticState>,
}

impl SyntheticUnit {
    pub fn state(&self) -> SyntheticState {
        self.state.borrow().clone()
    }

    fn set_state(&self, state: SyntheticState) {
        *self.state.borrow_mut() = state;
    }

    fn reflection(&self) -> Reflection {
        Reflection {
            cells: self.cells.clone(),
        }
    }
}

impl ModuleUnit for SyntheticUnit {
    fn url(&self) -> &Url {
        &self.cells.url
    }

    fn link(
        &self,
        _resolve: &mut dyn FnMut(&str) -> DependencyFuture,
    ) -> Result<Vec<PendingLink>, LoaderError> {
        // The only dependency, the reflective cells, was wired at construction
        Ok(Vec::new())
    }

    fn instantiate(&self) -> Result<(), LoaderError> {
        if matches!(self.state(), SyntheticState::Linked) {
            self.set_state(SyntheticState::Instantiated);
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<Option<Value>, LoaderError> {
        match self.state() {
            SyntheticState::Instantiated => {}
            SyntheticState::Evaluating | SyntheticState::Evaluated => return Ok(None),
            SyntheticState::Errored(e) => return Err(e),
            SyntheticState::Linked => {
                return Err(LoaderError::Evaluate {
                    url: self.cells.url.clone(),
                    message: "module has not been instantiated".to_string(),
                })
            }
        }

        self.set_state(SyntheticState::Evaluating);
        let executor = self.cells.executor.borrow_mut().take();
        let result = match executor {
            Some(executor) => executor(&self.reflection()),
            None => Ok(()),
        };

        match result {
            Ok(()) => {
                self.set_state(SyntheticState::Evaluated);
                Ok(None)
            }
            Err(e) => {
                self.set_state(SyntheticState::Errored(e.clone()));
                Err(e)
            }
        }
    }

    fn namespace(&self) -> Result<Namespace, LoaderError> {
        Ok(Namespace::new(self.cells.bindings.clone()))
    }

    fn export_binding(&self, name: &str) -> Option<Binding> {
        self.cells.bindings.get(name).cloned()
    }
}

/// Build a dynamic module exposing `export_names` at `url`.
///
/// When `populate` is supplied it becomes the executor, so it runs when the
/// facade evaluates. Returns the facade (the unit a job translates to) and
/// the accessor bundle for later host-side updates.
pub fn create_dynamic_module(
    export_names: &[String],
    url: &Url,
    populate: Option<Executor>,
) -> (Rc<SyntheticUnit>, Reflection) {
    let bindings = export_names
        .iter()
        .map(|name| (name.clone(), Binding::default()))
        .collect();

    let cells = Rc::new(ReflectiveCells {
        url: url.clone(),
        bindings,
        executor: RefCell::new(None),
    });

    let reflection = Reflection { cells: cells.clone() };
    if let Some(populate) = populate {
        reflection.set_executor(populate);
    }

    let facade = Rc::new(SyntheticUnit {
        cells,
        state: RefCell::new(SyntheticState::Linked),
    });

    (facade, reflection)
}
