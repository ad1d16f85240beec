//! Loader error types.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

/// Errors that can occur while resolving, translating, linking,
/// instantiating or evaluating modules.
///
/// Every phase of a module job is a shared future, so the same failure is
/// handed to every current and future awaiter. That is why this type is
/// `Clone` and wraps I/O errors in an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// Specifier could not be parsed against its referrer
    #[error("Invalid module specifier '{specifier}': {source}")]
    InvalidSpecifier {
        specifier: String,
        #[source]
        source: url::ParseError,
    },

    /// No local candidate file exists
    #[error("Cannot find module '{specifier}' (tried: {tried:?})")]
    ModuleNotFound { specifier: String, tried: Vec<PathBuf> },

    /// A `file:` URL that does not map to a filesystem path
    #[error("URL does not denote a local file path: {0}")]
    InvalidFileUrl(Url),

    /// A format or scheme with no translator behind it
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// I/O error while reading module source
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Module source is not valid UTF-8
    #[error("Module source is not valid UTF-8: {0}")]
    InvalidEncoding(Url),

    /// Malformed `data:` URL
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// The eval sentinel was imported before any eval source was supplied
    #[error("No eval source has been supplied")]
    MissingEvalSource,

    /// The loader's single eval module was already created
    #[error("The eval module has already been loaded")]
    EvalAlreadyLoaded,

    /// Component registry has no library under this identifier
    #[error("Unknown builtin module '{0}'")]
    UnknownBuiltin(String),

    /// Component registered twice under the same identifier
    #[error("Builtin module '{0}' is already registered")]
    DuplicateComponent(String),

    /// Module compiler rejected the source
    #[error("Failed to compile {url}: {message}")]
    Compile { url: Url, message: String },

    /// Module unit failed to link
    #[error("Failed to link {url}: {message}")]
    Link { url: Url, message: String },

    /// Module graph failed to instantiate
    #[error("Failed to instantiate {url}: {message}")]
    Instantiate { url: Url, message: String },

    /// Module body raised an error
    #[error("Error evaluating {url}: {message}")]
    Evaluate { url: Url, message: String },

    /// Import or accessor names a binding the module does not export
    #[error("Module {url} has no export named '{name}'")]
    UnknownExport { url: Url, name: String },

    /// The filesystem probe limiter was closed
    #[error("Filesystem probe limiter is closed")]
    ProbeLimiterClosed,

    /// A job outlived the loader that created it
    #[error("Module loader has been dropped")]
    LoaderDropped,
}

impl LoaderError {
    /// Build an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoaderError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Whether this error came out of specifier resolution
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            LoaderError::InvalidSpecifier { .. }
                | LoaderError::ModuleNotFound { .. }
                | LoaderError::InvalidFileUrl(_)
        )
    }
}

/// Errors that can occur while loading a loader configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Working directory cannot be expressed as a `file:` URL
    #[error("Working directory is not an absolute path: {}", .0.display())]
    InvalidCwd(PathBuf),
}
