//! Module source retrieval
//!
//! Obtains the source text behind a canonical URL for the js translator:
//! - the eval URL reads the out-of-band eval source
//! - `data:` URLs decode their body in place
//! - `file:` URLs read from the filesystem

use base64::Engine;
use percent_encoding::percent_decode_str;
use url::{Position, Url};

use crate::error::LoaderError;
use crate::host::FileSystem;
use crate::resolver::eval_url;

/// Decode the body of a `data:` URL.
///
/// Format: `data:[<mediatype>][;base64],<body>`. The body is percent-decoded,
/// then base64-decoded when the metadata ends in `;base64`.
pub fn decode_data_url(url: &Url) -> Result<Vec<u8>, LoaderError> {
    if url.scheme() != "data" {
        return Err(LoaderError::InvalidDataUrl(url.to_string()));
    }

    // The body may legitimately contain '?', so keep the query part
    let rest = &url[Position::BeforePath..Position::AfterQuery];
    let (meta, body) = rest
        .split_once(',')
        .ok_or_else(|| LoaderError::InvalidDataUrl(format!("missing ',' in {}", url)))?;

    let bytes: Vec<u8> = percent_decode_str(body).collect();

    if meta.trim_end().to_ascii_lowercase().ends_with(";base64") {
        let compact: Vec<u8> = bytes.into_iter().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| LoaderError::InvalidDataUrl(format!("{}: {}", url, e)))
    } else {
        Ok(bytes)
    }
}

/// Fetch the source text for a module URL
pub async fn fetch_source(
    url: &Url,
    fs: &dyn FileSystem,
    eval_source: Option<&str>,
) -> Result<String, LoaderError> {
    if url == eval_url() {
        return eval_source
            .map(str::to_string)
            .ok_or(LoaderError::MissingEvalSource);
    }

    let bytes = match url.scheme() {
        "data" => decode_data_url(url)?,
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| LoaderError::InvalidFileUrl(url.clone()))?;
            log::trace!("reading {}", path.display());
            fs.read(&path).await.map_err(|e| LoaderError::io(path, e))?
        }
        scheme => {
            return Err(LoaderError::Unimplemented(format!(
                "loading source over the '{}' scheme ({})",
                scheme, url
            )))
        }
    };

    String::from_utf8(bytes).map_err(|_| LoaderError::InvalidEncoding(url.clone()))
}
