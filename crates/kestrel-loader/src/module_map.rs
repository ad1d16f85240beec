//! Module map
//!
//! Loader-scoped cache from canonical URL to module job. Jobs live in an
//! arena and refer to each other by [`JobId`], so a cyclic graph never turns
//! into a reference cycle. The map only grows.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::job::ModuleJob;

/// Index of a job in its loader's module map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) usize);

impl JobId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical URL → job, plus lookup statistics
#[derive(Default)]
pub(crate) struct ModuleMap {
    /// Jobs in creation order, indexed by `JobId`
    jobs: Vec<ModuleJob>,
    by_url: HashMap<Url, JobId>,
    hits: usize,
    misses: usize,
}

impl ModuleMap {
    /// Look up the job for a canonical URL, counting the hit or miss
    pub fn lookup(&mut self, url: &Url) -> Option<ModuleJob> {
        match self.by_url.get(url) {
            Some(id) => {
                self.hits += 1;
                log::trace!("module map hit {} -> {}", url, id);
                Some(self.jobs[id.0].clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up without touching the statistics
    pub fn peek(&self, url: &Url) -> Option<&ModuleJob> {
        self.by_url.get(url).and_then(|id| self.jobs.get(id.0))
    }

    /// Id the next inserted job must carry
    pub fn next_id(&self) -> JobId {
        JobId(self.jobs.len())
    }

    pub fn insert(&mut self, job: ModuleJob) {
        debug_assert_eq!(job.id(), self.next_id());
        debug_assert!(!self.by_url.contains_key(job.url()));

        self.by_url.insert(job.url().clone(), job.id());
        self.jobs.push(job);
    }

    pub fn get(&self, id: JobId) -> Option<&ModuleJob> {
        self.jobs.get(id.0)
    }

    /// Canonical URLs in creation order
    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.jobs.iter().map(ModuleJob::url)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.jobs.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Module map statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of jobs in the map
    pub entries: usize,
    /// Lookups that found an existing job
    pub hits: usize,
    /// Lookups that created a new job
    pub misses: usize,
}

impl CacheStats {
    /// Get cache hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
