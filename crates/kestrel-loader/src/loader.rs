//! Loader
//!
//! Entry point of the subsystem. Resolves specifiers to canonical URLs,
//! keeps one [`ModuleJob`] per canonical URL in its module map, and drives
//! import → run → namespace.
//!
//! The loader is single-threaded (`!Send`). Jobs start their link phase with
//! `tokio::task::spawn_local`, so every async operation must be driven from
//! inside a `tokio::task::LocalSet`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use url::Url;

use crate::config::LoaderConfig;
use crate::error::{ConfigError, LoaderError};
use crate::host::Host;
use crate::job::{Completion, ModuleJob};
use crate::module_map::{CacheStats, JobId, ModuleMap};
use crate::resolver::{eval_url, ResolvedModule, Resolver};
use crate::translators::{EvalSource, Format, TranslatorRegistry};
use crate::value::Namespace;

pub(crate) struct LoaderState {
    resolver: Resolver,
    translators: TranslatorRegistry,
    module_map: RefCell<ModuleMap>,
    eval_source: EvalSource,
}

/// Module loader for one isolated module graph. Cloning shares the loader.
#[derive(Clone)]
pub struct Loader {
    state: Rc<LoaderState>,
}

impl Loader {
    /// Create a loader with an empty module map
    pub fn new(config: &LoaderConfig, host: Host) -> Result<Self, ConfigError> {
        let resolver = Resolver::new(config, host.fs.clone())?;
        let eval_source = EvalSource::default();
        let translators = TranslatorRegistry::new(&host, &config.builtin_prefix, eval_source.clone());

        Ok(Self {
            state: Rc::new(LoaderState {
                resolver,
                translators,
                module_map: RefCell::new(ModuleMap::default()),
                eval_source,
            }),
        })
    }

    pub(crate) fn from_weak(state: &Weak<LoaderState>) -> Result<Self, LoaderError> {
        state
            .upgrade()
            .map(|state| Self { state })
            .ok_or(LoaderError::LoaderDropped)
    }

    /// Resolve a specifier to its canonical URL and format
    pub async fn resolve(
        &self,
        specifier: &str,
        referrer: Option<&Url>,
    ) -> Result<ResolvedModule, LoaderError> {
        self.state.resolver.resolve(specifier, referrer).await
    }

    /// Get the job for a specifier, creating it on first use.
    ///
    /// A resolution failure creates no job.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`: a new job
    /// starts its link phase with `spawn_local`.
    pub async fn get_module_job(
        &self,
        specifier: &str,
        referrer: Option<&Url>,
    ) -> Result<ModuleJob, LoaderError> {
        let ResolvedModule { url, format } = self.resolve(specifier, referrer).await?;
        Ok(self.job_for(url, format))
    }

    /// Look up or create the job for a canonical URL.
    ///
    /// Synchronous: no other task can touch the module map between the lookup
    /// and the insertion, so concurrent requests for one URL share one job.
    fn job_for(&self, url: Url, format: Format) -> ModuleJob {
        let mut module_map = self.state.module_map.borrow_mut();
        if let Some(job) = module_map.lookup(&url) {
            return job;
        }

        let translation = self.state.translators.translate(format, &url);
        let job = ModuleJob::new(
            module_map.next_id(),
            url,
            format,
            Rc::downgrade(&self.state),
            translation,
        );
        module_map.insert(job.clone());
        job
    }

    /// Import a module: get its job, run it and return its namespace
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`: a new job
    /// starts its link phase with `spawn_local`.
    pub async fn import(
        &self,
        specifier: &str,
        referrer: Option<&Url>,
    ) -> Result<Namespace, LoaderError> {
        let job = self.get_module_job(specifier, referrer).await?;
        job.run().await?;
        job.namespace().await
    }

    /// Run `source` as the eval module and return its completion.
    ///
    /// There is one eval module per loader, so this succeeds at most once.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`: a new job
    /// starts its link phase with `spawn_local`.
    pub async fn eval(&self, source: &str) -> Result<Completion, LoaderError> {
        if self.state.module_map.borrow().peek(eval_url()).is_some() {
            return Err(LoaderError::EvalAlreadyLoaded);
        }

        self.set_eval_source(source);
        let specifier = self.state.resolver.eval_specifier().to_string();
        let job = self.get_module_job(&specifier, None).await?;
        job.run().await
    }

    /// Supply the out-of-band source read when the eval module is translated
    pub fn set_eval_source(&self, source: &str) {
        *self.state.eval_source.borrow_mut() = Some(source.into());
    }

    /// Job by id
    pub fn job(&self, id: JobId) -> Option<ModuleJob> {
        self.state.module_map.borrow().get(id).cloned()
    }

    /// Job for a canonical URL, if one was created
    pub fn job_by_url(&self, url: &Url) -> Option<ModuleJob> {
        self.state.module_map.borrow().peek(url).cloned()
    }

    /// Canonical URLs in the module map, in creation order
    pub fn module_urls(&self) -> Vec<Url> {
        self.state.module_map.borrow().urls().cloned().collect()
    }

    /// Number of jobs in the module map
    pub fn len(&self) -> usize {
        self.state.module_map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state.module_map.borrow().stats()
    }

    pub fn base_url(&self) -> &Url {
        self.state.resolver.base_url()
    }

    pub fn cwd_url(&self) -> &Url {
        self.state.resolver.cwd_url()
    }

    pub fn ptr_eq(&self, other: &Loader) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}
