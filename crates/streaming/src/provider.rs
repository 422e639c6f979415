use std::future::Future;
use std::pin::Pin;

use foundation::ids::SourceId;
use formats::{ColumnMetadata, FeatureCollection, FilterDefinition, FormatError, RecordSet};
use serde::Serialize;
use serde_json::{Map, Value};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type Record = Map<String, Value>;

/// Error type for data provider operations.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("data provider unreachable: {0}")]
    Unreachable(String),
    #[error("data provider returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unknown data source `{0}`")]
    UnknownSource(SourceId),
    #[error("undecodable payload: {0}")]
    Decode(#[from] FormatError),
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::Unreachable(err.to_string())
    }
}

/// Body of `POST /data/{source}/filtered`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredQuery {
    pub filters: Vec<FilterDefinition>,
    /// `{type, properties}` of the requesting layer; some sources shape their
    /// output by layer type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_config: Option<Value>,
}

impl FilteredQuery {
    pub fn new(filters: Vec<FilterDefinition>) -> Self {
        Self {
            filters,
            layer_config: None,
        }
    }
}

/// Backend holding the data behind layers and visualizations.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait DataProvider: Send + Sync {
    /// `GET /data/{source}/columns`
    fn columns<'a>(
        &'a self,
        source: &'a SourceId,
    ) -> BoxFuture<'a, Result<Vec<ColumnMetadata>, DataError>>;

    /// `POST /data/{source}/filtered`
    fn filtered<'a>(
        &'a self,
        source: &'a SourceId,
        query: &'a FilteredQuery,
    ) -> BoxFuture<'a, Result<FeatureCollection, DataError>>;

    /// `GET /data/{source}`
    fn records<'a>(&'a self, source: &'a SourceId) -> BoxFuture<'a, Result<RecordSet, DataError>>;
}
