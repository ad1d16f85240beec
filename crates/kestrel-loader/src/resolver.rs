//! Specifier resolution
//!
//! Turns an import specifier plus a referrer into a canonical URL and the
//! format that decides how the URL is translated.
//!
//! # Resolution Order
//! 1. The eval sentinel resolves to the fixed eval URL
//! 2. `@rt/<id>` (the builtin prefix) resolves to `builtin:@rt/<id>`
//! 3. Everything else is parsed as a URL against the referrer, with eval/REPL
//!    referrers replaced by the working directory
//! 4. `file:` URLs probe `<path>` and `<path>.<ext>` concurrently; the literal
//!    path wins when both exist

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;

use tokio::sync::Semaphore;
use url::Url;

use crate::config::LoaderConfig;
use crate::error::{ConfigError, LoaderError};
use crate::host::{FileKind, FileSystem};
use crate::translators::Format;

static EVAL_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("internal:[eval]").expect("eval URL is well-formed"));

static REPL_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("internal:[repl]").expect("REPL URL is well-formed"));

/// Fixed URL of the out-of-band eval module
pub fn eval_url() -> &'static Url {
    &EVAL_URL
}

/// Referrer URL of code typed into a REPL
pub fn repl_url() -> &'static Url {
    &REPL_URL
}

/// Whether a referrer is an eval/REPL execution context rather than a location
pub fn is_virtual_referrer(url: &Url) -> bool {
    url == eval_url() || url == repl_url()
}

/// A specifier resolved to its canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Canonical URL, the module map key
    pub url: Url,
    /// Translator that will handle the URL
    pub format: Format,
}

/// Resolver for import specifiers
pub struct Resolver {
    base_url: Url,
    cwd_url: Url,
    source_extension: String,
    builtin_prefix: String,
    eval_specifier: String,
    fs: Rc<dyn FileSystem>,
    /// Caps outstanding filesystem probes, not resolutions
    probe_limit: Semaphore,
}

impl Resolver {
    /// Create a resolver from a validated configuration
    pub fn new(config: &LoaderConfig, fs: Rc<dyn FileSystem>) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            base_url: config.base_url()?,
            cwd_url: config.cwd_url()?,
            source_extension: config.source_extension.clone(),
            builtin_prefix: config.builtin_prefix.clone(),
            eval_specifier: config.eval_specifier.clone(),
            fs,
            probe_limit: Semaphore::new(config.max_concurrent_probes),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cwd_url(&self) -> &Url {
        &self.cwd_url
    }

    pub fn builtin_prefix(&self) -> &str {
        &self.builtin_prefix
    }

    pub fn eval_specifier(&self) -> &str {
        &self.eval_specifier
    }

    /// Resolve a specifier against a referrer (or the base URL)
    pub async fn resolve(
        &self,
        specifier: &str,
        referrer: Option<&Url>,
    ) -> Result<ResolvedModule, LoaderError> {
        if specifier == self.eval_specifier {
            return Ok(ResolvedModule {
                url: eval_url().clone(),
                format: Format::Js,
            });
        }

        if specifier.starts_with(&self.builtin_prefix) {
            let url = Url::parse(&format!("builtin:{}", specifier)).map_err(|source| {
                LoaderError::InvalidSpecifier {
                    specifier: specifier.to_string(),
                    source,
                }
            })?;
            return Ok(ResolvedModule {
                url,
                format: Format::Builtin,
            });
        }

        let referrer = match referrer {
            Some(url) if is_virtual_referrer(url) => &self.cwd_url,
            Some(url) => url,
            None => &self.base_url,
        };

        let url = referrer
            .join(specifier)
            .map_err(|source| LoaderError::InvalidSpecifier {
                specifier: specifier.to_string(),
                source,
            })?;

        match url.scheme() {
            "file" => self.probe_local(specifier, url).await,
            "data" => Ok(ResolvedModule {
                url,
                format: Format::Js,
            }),
            _ => Ok(ResolvedModule {
                url,
                format: Format::Remote,
            }),
        }
    }

    /// Pick the first existing candidate for a local file URL
    async fn probe_local(&self, specifier: &str, url: Url) -> Result<ResolvedModule, LoaderError> {
        let literal = url
            .to_file_path()
            .map_err(|()| LoaderError::InvalidFileUrl(url.clone()))?;

        let mut with_extension = literal.clone().into_os_string();
        with_extension.push(".");
        with_extension.push(&self.source_extension);
        let with_extension = PathBuf::from(with_extension);

        let (literal_exists, extension_exists) =
            tokio::join!(self.probe(&literal), self.probe(&with_extension));

        if literal_exists? {
            log::debug!("resolved '{}' -> {}", specifier, url);
            return Ok(ResolvedModule {
                url,
                format: Format::Js,
            });
        }

        if extension_exists? {
            let mut url = url;
            let path = format!("{}.{}", url.path(), self.source_extension);
            url.set_path(&path);
            log::debug!("resolved '{}' -> {}", specifier, url);
            return Ok(ResolvedModule {
                url,
                format: Format::Js,
            });
        }

        Err(LoaderError::ModuleNotFound {
            specifier: specifier.to_string(),
            tried: vec![literal, with_extension],
        })
    }

    /// Existence probe gated by the concurrency limiter
    async fn probe(&self, path: &Path) -> Result<bool, LoaderError> {
        let _permit = self
            .probe_limit
            .acquire()
            .await
            .map_err(|_| LoaderError::ProbeLimiterClosed)?;

        let exists = matches!(self.fs.stat(path).await, Ok(FileKind::File));
        log::trace!("probe {} -> {}", path.display(), exists);
        Ok(exists)
    }
}
