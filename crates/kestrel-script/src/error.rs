//! Script error types

use kestrel_loader::LoaderError;
use thiserror::Error;
use url::Url;

/// Errors raised while compiling or running a script module
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// Source text could not be tokenized
    #[error("{line}:{column}: {message}")]
    Lex {
        line: u32,
        column: u32,
        message: String,
    },

    /// Token stream does not form a valid module
    #[error("{line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    /// A name is declared or exported twice
    #[error("Duplicate declaration of '{0}'")]
    Duplicate(String),

    /// Module body failed while running
    #[error("{0}")]
    Runtime(String),
}

impl ScriptError {
    /// Convert into the loader's compile error for `url`
    pub fn into_compile_error(self, url: &Url) -> LoaderError {
        LoaderError::Compile {
            url: url.clone(),
            message: self.to_string(),
        }
    }

    /// Convert into the loader's evaluation error for `url`
    pub fn into_evaluate_error(self, url: &Url) -> LoaderError {
        LoaderError::Evaluate {
            url: url.clone(),
            message: self.to_string(),
        }
    }
}
