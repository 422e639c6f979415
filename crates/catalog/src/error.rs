use foundation::ids::ViewId;
use formats::FormatError;

/// Failure to obtain a usable view document.
///
/// The view is left unresolved whenever one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFetchError {
    #[error("view provider unreachable: {0}")]
    Unreachable(String),
    #[error("view provider returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("view `{0}` not found")]
    NotFound(ViewId),
    #[error("malformed view document: {0}")]
    Malformed(#[from] FormatError),
}

impl From<reqwest::Error> for ConfigFetchError {
    fn from(err: reqwest::Error) -> Self {
        ConfigFetchError::Unreachable(err.to_string())
    }
}
