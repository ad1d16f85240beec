//! Component instantiation record
//!
//! One record is shared by every job of a connected component. It holds the
//! single once-flag for the component, so the unit-level instantiate runs
//! exactly once and every member observes the same outcome.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::error::LoaderError;
use crate::host::ModuleUnit;
use crate::module_map::JobId;

pub struct ComponentInstantiation {
    root: JobId,
    root_url: Url,
    /// Unit of the root job; instantiating it binds the whole component
    unit: Rc<dyn ModuleUnit>,
    /// Every job reached from the root, the root first
    members: Vec<JobId>,
    outcome: OnceCell<Result<(), LoaderError>>,
}

impl ComponentInstantiation {
    pub(crate) fn new(root: JobId, root_url: Url, unit: Rc<dyn ModuleUnit>, members: Vec<JobId>) -> Self {
        Self {
            root,
            root_url,
            unit,
            members,
            outcome: OnceCell::new(),
        }
    }

    /// Job whose instantiate call collected this component
    pub fn root(&self) -> JobId {
        self.root
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    pub fn members(&self) -> &[JobId] {
        &self.members
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.members.contains(&id)
    }

    /// Whether the component has been instantiated successfully
    pub fn is_instantiated(&self) -> bool {
        matches!(self.outcome.get(), Some(Ok(())))
    }

    /// Instantiate the root unit on first call; later calls replay the outcome
    pub(crate) fn instantiate(&self) -> Result<(), LoaderError> {
        self.outcome
            .get_or_init(|| {
                log::debug!(
                    "instantiating component rooted at {} ({} modules)",
                    self.root_url,
                    self.members.len()
                );
                self.unit.instantiate()
            })
            .clone()
    }
}

impl fmt::Debug for ComponentInstantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstantiation")
            .field("root", &self.root)
            .field("root_url", &self.root_url.as_str())
            .field("members", &self.members)
            .field("outcome", &self.outcome.get())
            .finish()
    }
}
