use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use foundation::ids::SourceId;
use formats::{ColumnMetadata, Feature, FeatureCollection, FilterDefinition, RecordSet, infer_columns};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::provider::{BoxFuture, DataError, DataProvider, FilteredQuery, Record};

/// A request observed by [`InMemoryDataProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Columns(SourceId),
    Filtered {
        source: SourceId,
        filters: Vec<FilterDefinition>,
    },
    Records(SourceId),
}

impl ProviderCall {
    pub fn source(&self) -> &SourceId {
        match self {
            ProviderCall::Columns(s) | ProviderCall::Records(s) => s,
            ProviderCall::Filtered { source, .. } => source,
        }
    }
}

/// Serves features held in memory, applying filters the way the data service
/// does. Records every call; sources can be made to fail or respond late.
#[derive(Debug, Default)]
pub struct InMemoryDataProvider {
    sources: RwLock<BTreeMap<SourceId, Vec<Feature>>>,
    columnar: RwLock<BTreeMap<SourceId, Map<String, Value>>>,
    failing: RwLock<BTreeSet<SourceId>>,
    delays: RwLock<BTreeMap<SourceId, Duration>>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl InMemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents of `source`. Non-object entries are ignored.
    pub fn insert(&self, source: impl Into<SourceId>, features: Vec<Value>) {
        let features = features
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(o) => Some(Feature::new(o)),
                _ => None,
            })
            .collect();
        self.sources.write().insert(source.into(), features);
    }

    /// Attaches columnar series to `source`, served beside its rows by
    /// `records`. Creates the source when missing.
    pub fn insert_columns(&self, source: impl Into<SourceId>, columns: Map<String, Value>) {
        let source = source.into();
        self.sources.write().entry(source.clone()).or_default();
        self.columnar.write().insert(source, columns);
    }

    pub fn set_failing(&self, source: impl Into<SourceId>, failing: bool) {
        let source = source.into();
        let mut set = self.failing.write();
        if failing {
            set.insert(source);
        } else {
            set.remove(&source);
        }
    }

    /// Delays every response for `source`.
    pub fn set_delay(&self, source: impl Into<SourceId>, delay: Duration) {
        self.delays.write().insert(source.into(), delay);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    pub fn filtered_calls(&self, source: &str) -> usize {
        self.count(source, |c| matches!(c, ProviderCall::Filtered { .. }))
    }

    pub fn records_calls(&self, source: &str) -> usize {
        self.count(source, |c| matches!(c, ProviderCall::Records(_)))
    }

    pub fn columns_calls(&self, source: &str) -> usize {
        self.count(source, |c| matches!(c, ProviderCall::Columns(_)))
    }

    fn count(&self, source: &str, pred: impl Fn(&ProviderCall) -> bool) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.source().as_str() == source && pred(c))
            .count()
    }

    async fn enter(&self, call: ProviderCall) -> Result<Vec<Feature>, DataError> {
        let source = call.source().clone();
        self.calls.lock().push(call);
        let delay = self.delays.read().get(&source).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.read().contains(&source) {
            return Err(DataError::Status {
                status: 500,
                url: format!("memory://data/{source}"),
            });
        }
        self.sources
            .read()
            .get(&source)
            .cloned()
            .ok_or(DataError::UnknownSource(source))
    }
}

impl DataProvider for InMemoryDataProvider {
    fn columns<'a>(
        &'a self,
        source: &'a SourceId,
    ) -> BoxFuture<'a, Result<Vec<ColumnMetadata>, DataError>> {
        Box::pin(async move {
            let features = self.enter(ProviderCall::Columns(source.clone())).await?;
            let records: Vec<Record> = features.into_iter().map(Feature::into_record).collect();
            Ok(infer_columns(&records))
        })
    }

    fn filtered<'a>(
        &'a self,
        source: &'a SourceId,
        query: &'a FilteredQuery,
    ) -> BoxFuture<'a, Result<FeatureCollection, DataError>> {
        Box::pin(async move {
            let call = ProviderCall::Filtered {
                source: source.clone(),
                filters: query.filters.clone(),
            };
            let features = self.enter(call).await?;
            let kept = features
                .into_iter()
                .filter(|f| query.filters.iter().all(|flt| flt.matches_feature(f)))
                .collect();
            Ok(FeatureCollection::new(kept))
        })
    }

    fn records<'a>(&'a self, source: &'a SourceId) -> BoxFuture<'a, Result<RecordSet, DataError>> {
        Box::pin(async move {
            let features = self.enter(ProviderCall::Records(source.clone())).await?;
            Ok(RecordSet {
                rows: features.into_iter().map(Feature::into_record).collect(),
                columns: self.columnar.read().get(source).cloned().unwrap_or_default(),
            })
        })
    }
}
