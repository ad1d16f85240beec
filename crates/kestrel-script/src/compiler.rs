//! Module compiler for script sources

use std::rc::Rc;

use kestrel_loader::{LoaderError, ModuleCompiler, ModuleUnit};
use url::Url;

use crate::parser::parse;
use crate::unit::ScriptUnit;

/// Compiles script source text into [`ScriptUnit`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile without erasing the unit type
    pub fn compile_unit(&self, source: &str, url: &Url) -> Result<ScriptUnit, LoaderError> {
        let module = parse(source).map_err(|e| e.into_compile_error(url))?;
        let unit = ScriptUnit::new(module, url).map_err(|e| e.into_compile_error(url))?;
        log::trace!("compiled script {}", url);
        Ok(unit)
    }
}

impl ModuleCompiler for ScriptCompiler {
    fn compile(&self, source: &str, url: &Url) -> Result<Rc<dyn ModuleUnit>, LoaderError> {
        Ok(Rc::new(self.compile_unit(source, url)?))
    }
}
