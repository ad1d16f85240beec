//! Module Job
//!
//! Owns the lifecycle of one module unit, identified by its canonical URL:
//!
//! ```text
//! Translating -> Linking -> Linked -> Instantiating -> Instantiated -> Evaluated
//! ```
//!
//! Each phase is a memoized shared future, so every awaiter (concurrent or
//! later) observes the same outcome and a failure is never retried.
//!
//! # Linking
//! Construction spawns the link phase right away: await the translation,
//! hand the unit a dependency callback that asks the loader for each
//! dependency's job, and settle with the ids of the direct dependencies.
//! Linking only ever *obtains* dependency jobs; it never waits on their link
//! phase, so cycles cannot deadlock here.
//!
//! # Instantiation
//! The first `instantiate()` walks the graph from this job with an explicit
//! worklist, waiting on each reached job's link phase. The visited set is the
//! connected component. A [`ComponentInstantiation`] record is created for
//! it and the root unit is instantiated once; every other member is then
//! attached to that record instead of instantiating its own unit.

use std::cell::{OnceCell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::{try_join_all, FutureExt, LocalBoxFuture, Shared};
use url::Url;

use crate::dynamic_module::Reflection;
use crate::error::LoaderError;
use crate::host::{DependencyFuture, ModuleUnit};
use crate::instantiation::ComponentInstantiation;
use crate::loader::{Loader, LoaderState};
use crate::module_map::JobId;
use crate::translators::{Format, Translation};
use crate::value::{Namespace, Value};

type SharedResult<T> = Shared<LocalBoxFuture<'static, Result<T, LoaderError>>>;

/// Outcome of [`ModuleJob::run`]
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Evaluation produced a result value
    Value(Value),
    /// Nothing meaningful was produced
    Empty,
}

impl Completion {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Completion::Value(value) => Some(value),
            Completion::Empty => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Completion::Value(value) => Some(value),
            Completion::Empty => None,
        }
    }
}

struct JobInner {
    id: JobId,
    url: Url,
    format: Format,
    loader: Weak<LoaderState>,
    translation: SharedResult<Translation>,
    /// Direct dependencies, started at construction
    linked: SharedResult<Rc<[JobId]>>,
    /// Created by the first `instantiate()` call
    instantiated: OnceCell<SharedResult<()>>,
    /// Component this job was instantiated with, own or someone else's
    component: RefCell<Option<Rc<ComponentInstantiation>>>,
}

/// Handle to a module job. Cloning shares the job.
#[derive(Clone)]
pub struct ModuleJob {
    inner: Rc<JobInner>,
}

impl ModuleJob {
    /// Create a job around a translation future and start linking it.
    ///
    /// Must be called inside a `tokio::task::LocalSet`.
    pub(crate) fn new(
        id: JobId,
        url: Url,
        format: Format,
        loader: Weak<LoaderState>,
        translation: LocalBoxFuture<'static, Result<Translation, LoaderError>>,
    ) -> Self {
        let translation = translation.shared();
        let linked = link(url.clone(), translation.clone(), loader.clone())
            .boxed_local()
            .shared();

        let background = linked.clone();
        let log_url = url.clone();
        tokio::task::spawn_local(async move {
            if let Err(e) = background.await {
                log::debug!("linking {} failed: {}", log_url, e);
            }
        });

        log::debug!("created job {} for {} ({})", id, url, format);

        Self {
            inner: Rc::new(JobInner {
                id,
                url,
                format,
                loader,
                translation,
                linked,
                instantiated: OnceCell::new(),
                component: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> JobId {
        self.inner.id
    }

    /// Canonical URL, the job's identity
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn format(&self) -> Format {
        self.inner.format
    }

    /// Wait for the translation
    pub async fn translation(&self) -> Result<Translation, LoaderError> {
        self.inner.translation.clone().await
    }

    async fn unit(&self) -> Result<Rc<dyn ModuleUnit>, LoaderError> {
        Ok(self.translation().await?.unit)
    }

    /// Accessor bundle of a builtin module, `None` for source modules
    pub async fn reflection(&self) -> Result<Option<Reflection>, LoaderError> {
        Ok(self.translation().await?.reflection)
    }

    /// Wait for the link phase; yields the ids of the direct dependencies
    pub async fn linked(&self) -> Result<Rc<[JobId]>, LoaderError> {
        self.inner.linked.clone().await
    }

    /// Direct dependency jobs, once linked
    pub async fn dependencies(&self) -> Result<Vec<ModuleJob>, LoaderError> {
        let ids = self.linked().await?;
        let loader = Loader::from_weak(&self.inner.loader)?;
        ids.iter().map(|id| self.lookup(&loader, *id)).collect()
    }

    /// Root of the component this job was instantiated with
    pub fn component_root(&self) -> Option<JobId> {
        self.inner.component.borrow().as_ref().map(|c| c.root())
    }

    fn component(&self) -> Option<Rc<ComponentInstantiation>> {
        self.inner.component.borrow().clone()
    }

    /// Instantiate the component this job belongs to.
    ///
    /// Memoized: the first call starts the work and every call, concurrent
    /// or later, observes the same outcome.
    pub async fn instantiate(&self) -> Result<(), LoaderError> {
        let instantiated = self
            .inner
            .instantiated
            .get_or_init(|| {
                // Weak, so the memoized future does not keep its own job alive
                let weak = Rc::downgrade(&self.inner);
                async move {
                    let inner = weak.upgrade().ok_or(LoaderError::LoaderDropped)?;
                    let job = ModuleJob { inner };
                    job.instantiate_component().await
                }
                .boxed_local()
                .shared()
            })
            .clone();

        instantiated.await
    }

    async fn instantiate_component(&self) -> Result<(), LoaderError> {
        if let Some(component) = self.component() {
            return component.instantiate();
        }

        let unit = self.unit().await?;
        let loader = Loader::from_weak(&self.inner.loader)?;
        let members = self.collect_component(&loader).await?;

        // Another member may have instantiated this component while we walked it
        if let Some(component) = self.component() {
            return component.instantiate();
        }

        let component = Rc::new(ComponentInstantiation::new(
            self.id(),
            self.url().clone(),
            unit,
            members,
        ));
        self.attach(&component);
        component.instantiate()?;

        for &id in component.members() {
            if id != self.id() {
                self.lookup(&loader, id)?.attach(&component);
            }
        }

        Ok(())
    }

    /// Depth-first walk over every job reachable from this one
    async fn collect_component(&self, loader: &Loader) -> Result<Vec<JobId>, LoaderError> {
        let mut visited = HashSet::new();
        let mut members = Vec::new();
        let mut stack = vec![self.clone()];

        while let Some(job) = stack.pop() {
            if !visited.insert(job.id()) {
                continue;
            }
            members.push(job.id());

            let dependencies = job.linked().await?;
            for &id in dependencies.iter().rev() {
                if !visited.contains(&id) {
                    stack.push(self.lookup(loader, id)?);
                }
            }
        }

        Ok(members)
    }

    /// Join a component unless this job already belongs to one
    fn attach(&self, component: &Rc<ComponentInstantiation>) {
        let mut slot = self.inner.component.borrow_mut();
        if slot.is_none() {
            *slot = Some(component.clone());
        }
    }

    fn lookup(&self, loader: &Loader, id: JobId) -> Result<ModuleJob, LoaderError> {
        loader.job(id).ok_or_else(|| LoaderError::Link {
            url: self.url().clone(),
            message: format!("dependency job {} is missing from the module map", id),
        })
    }

    /// Instantiate, then evaluate this job's unit
    pub async fn run(&self) -> Result<Completion, LoaderError> {
        self.instantiate().await?;

        let unit = self.unit().await?;
        log::debug!("evaluating {}", self.url());
        let completion = match unit.evaluate()? {
            Some(value) => Completion::Value(value),
            None => Completion::Empty,
        };
        Ok(completion)
    }

    /// Exported bindings of the unit
    pub async fn namespace(&self) -> Result<Namespace, LoaderError> {
        self.unit().await?.namespace()
    }

    pub fn ptr_eq(&self, other: &ModuleJob) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ModuleJob {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ModuleJob {}

impl fmt::Debug for ModuleJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleJob")
            .field("id", &self.inner.id)
            .field("url", &self.inner.url.as_str())
            .field("format", &self.inner.format)
            .field("component_root", &self.component_root())
            .finish()
    }
}

/// The link phase of one job
async fn link(
    url: Url,
    translation: SharedResult<Translation>,
    loader: Weak<LoaderState>,
) -> Result<Rc<[JobId]>, LoaderError> {
    let unit = translation.await?.unit;

    let mut dependency_jobs: Vec<SharedResult<ModuleJob>> = Vec::new();
    let pending = {
        let mut resolve_dependency = |specifier: &str| -> DependencyFuture {
            let loader = loader.clone();
            let specifier = specifier.to_string();
            let referrer = url.clone();

            let job = async move {
                let loader = Loader::from_weak(&loader)?;
                loader.get_module_job(&specifier, Some(&referrer)).await
            }
            .boxed_local()
            .shared();
            dependency_jobs.push(job.clone());

            async move {
                let job = job.await?;
                job.unit().await
            }
            .boxed_local()
        };
        unit.link(&mut resolve_dependency)?
    };

    try_join_all(pending).await?;
    let dependencies = try_join_all(dependency_jobs).await?;
    log::trace!("linked {} ({} dependencies)", url, dependencies.len());

    Ok(dependencies.iter().map(ModuleJob::id).collect())
}
