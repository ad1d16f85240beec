//! Translator Registry
//!
//! Maps a resolved [`Format`] to the translator that turns a canonical URL
//! into a module unit, plus reflection hooks for builtin modules.
//!
//! | format    | translator |
//! |-----------|------------|
//! | `Js`      | [`JsTranslator`]: fetch source text, compile it |
//! | `Builtin` | [`BuiltinTranslator`]: bridge a host namespace |
//! | `Remote`  | none; translation fails as unimplemented |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use url::Url;

use crate::dynamic_module::{create_dynamic_module, Executor, Reflection};
use crate::error::LoaderError;
use crate::host::{ComponentRegistry, FileSystem, Host, ModuleCompiler, ModuleUnit};
use crate::source::fetch_source;

/// Classification of a resolved URL that selects its translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Source text compiled by the module compiler
    Js,
    /// Host namespace exposed through the dynamic module bridge
    Builtin,
    /// Non-local URL; nothing translates it
    Remote,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Js => "js",
            Format::Builtin => "builtin",
            Format::Remote => "remote",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a translator
#[derive(Clone)]
pub struct Translation {
    /// The compiled (or synthesized) unit
    pub unit: Rc<dyn ModuleUnit>,
    /// Accessor bundle, present for builtin modules only
    pub reflection: Option<Reflection>,
}

impl fmt::Debug for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translation")
            .field("url", &self.unit.url().as_str())
            .field("reflection", &self.reflection)
            .finish()
    }
}

/// Turns a canonical URL into a translation
pub trait Translator {
    fn translate(&self, url: &Url) -> LocalBoxFuture<'static, Result<Translation, LoaderError>>;
}

/// Out-of-band source for the eval module, shared with the loader
pub(crate) type EvalSource = Rc<RefCell<Option<Rc<str>>>>;

/// Reads source text (eval, `data:` or file) and compiles it
pub struct JsTranslator {
    fs: Rc<dyn FileSystem>,
    compiler: Rc<dyn ModuleCompiler>,
    eval_source: EvalSource,
}

impl Translator for JsTranslator {
    fn translate(&self, url: &Url) -> LocalBoxFuture<'static, Result<Translation, LoaderError>> {
        let url = url.clone();
        let fs = self.fs.clone();
        let compiler = self.compiler.clone();
        // Snapshot now; the job for the eval URL is created right after the source is set
        let eval_source = self.eval_source.borrow().clone();

        async move {
            let source = fetch_source(&url, fs.as_ref(), eval_source.as_deref()).await?;
            let unit = compiler.compile(&source, &url)?;
            log::debug!("compiled {}", url);
            Ok(Translation {
                unit,
                reflection: None,
            })
        }
        .boxed_local()
    }
}

/// Loads a host namespace from the component registry and bridges it
pub struct BuiltinTranslator {
    components: Rc<dyn ComponentRegistry>,
    prefix: String,
}

impl BuiltinTranslator {
    /// Library identifier behind a `builtin:` URL
    fn component_id<'a>(&self, url: &'a Url) -> Result<&'a str, LoaderError> {
        url.path()
            .strip_prefix(self.prefix.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LoaderError::UnknownBuiltin(url.path().to_string()))
    }

    fn translate_now(&self, url: &Url) -> Result<Translation, LoaderError> {
        let id = self.component_id(url)?;
        let component = self.components.load(id)?;

        let namespace = component.namespace;
        let populate: Executor = Box::new(move |reflection: &Reflection| {
            let names: Vec<String> = reflection.export_names().map(str::to_string).collect();
            for name in names {
                reflection.set(&name, namespace.get(&name).unwrap_or_default())?;
            }
            Ok(())
        });

        let (facade, reflection) = create_dynamic_module(&component.export_names, url, Some(populate));
        log::debug!(
            "bridged builtin '{}' ({} exports)",
            id,
            component.export_names.len()
        );

        Ok(Translation {
            unit: facade,
            reflection: Some(reflection),
        })
    }
}

impl Translator for BuiltinTranslator {
    fn translate(&self, url: &Url) -> LocalBoxFuture<'static, Result<Translation, LoaderError>> {
        future::ready(self.translate_now(url)).boxed_local()
    }
}

/// One translator per [`Format`] variant
pub struct TranslatorRegistry {
    js: JsTranslator,
    builtin: BuiltinTranslator,
}

impl TranslatorRegistry {
    pub(crate) fn new(host: &Host, builtin_prefix: &str, eval_source: EvalSource) -> Self {
        Self {
            js: JsTranslator {
                fs: host.fs.clone(),
                compiler: host.compiler.clone(),
                eval_source,
            },
            builtin: BuiltinTranslator {
                components: host.components.clone(),
                prefix: builtin_prefix.to_string(),
            },
        }
    }

    /// Translator registered for a format
    pub fn get(&self, format: Format) -> Option<&dyn Translator> {
        match format {
            Format::Js => Some(&self.js),
            Format::Builtin => Some(&self.builtin),
            Format::Remote => None,
        }
    }

    /// Start translating `url`. A format without a translator yields a
    /// future that fails as unimplemented.
    pub fn translate(
        &self,
        format: Format,
        url: &Url,
    ) -> LocalBoxFuture<'static, Result<Translation, LoaderError>> {
        match self.get(format) {
            Some(translator) => translator.translate(url),
            None => future::ready(Err(LoaderError::Unimplemented(format!(
                "no translator for {} module {}",
                format, url
            ))))
            .boxed_local(),
        }
    }
}
