use std::sync::Arc;
use std::time::Instant;

use compute::{ChartSpec, VisualizationData};
use foundation::ids::{LayerId, SourceId, VisualizationId};
use formats::{
    ColumnMetadata, FeatureCollection, FilterDefinition, FilterRejection, FormatError,
    validate_filters,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::ColumnCache;
use crate::provider::{DataError, DataProvider, FilteredQuery};

/// Why a layer or visualization could not be refreshed. The slot it targeted
/// keeps its previous value.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("provider request failed: {0}")]
    Provider(DataError),
    #[error("payload could not be decoded: {0}")]
    Decode(FormatError),
    #[error("column metadata for `{data_source}` unavailable: {error}")]
    Columns {
        data_source: SourceId,
        error: DataError,
    },
}

impl From<DataError> for FetchError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Decode(e) => FetchError::Decode(e),
            other => FetchError::Provider(other),
        }
    }
}

/// Everything needed to fetch one map layer, detached from engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerQuery {
    pub layer: LayerId,
    pub source: SourceId,
    pub filters: Vec<FilterDefinition>,
    /// `{type, properties}` forwarded with the filtered query.
    pub layer_config: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartQuery {
    pub visualization: VisualizationId,
    pub source: SourceId,
    pub spec: ChartSpec,
}

/// Issues provider requests on behalf of one resolved view.
///
/// Cloning is cheap; clones share the provider and the view's column cache.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn DataProvider>,
    columns: Arc<ColumnCache>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn DataProvider>, columns: Arc<ColumnCache>) -> Self {
        Self { provider, columns }
    }

    pub fn column_cache(&self) -> &Arc<ColumnCache> {
        &self.columns
    }

    pub async fn fetch_columns(
        &self,
        source: &SourceId,
    ) -> Result<Arc<Vec<ColumnMetadata>>, FetchError> {
        self.columns
            .get_or_fetch(source, self.provider.as_ref())
            .await
            .map_err(|error| FetchError::Columns {
                data_source: source.clone(),
                error,
            })
    }

    /// Validates the layer's filters against its source's columns, then runs
    /// the filtered query. Rejected filters are logged and never sent.
    pub async fn fetch_layer(&self, q: &LayerQuery) -> Result<FeatureCollection, FetchError> {
        let filters = if q.filters.is_empty() {
            Vec::new()
        } else {
            let columns = self.fetch_columns(&q.source).await?;
            let checked = validate_filters(&q.filters, &columns);
            for (f, reason) in &checked.rejected {
                match reason {
                    FilterRejection::Incomplete => {
                        debug!(layer = %q.layer, column = %f.column, "incomplete filter skipped")
                    }
                    _ => warn!(
                        layer = %q.layer,
                        column = %f.column,
                        reason = ?reason,
                        "filter dropped"
                    ),
                }
            }
            checked.accepted
        };

        let query = FilteredQuery {
            filters,
            layer_config: q.layer_config.clone(),
        };
        let started = Instant::now();
        let data = self.provider.filtered(&q.source, &query).await?;
        debug!(
            layer = %q.layer,
            source = %q.source,
            features = data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "layer data fetched"
        );
        Ok(data)
    }

    /// Unfiltered read of the source, aggregated for the chart kind.
    pub async fn fetch_visualization(
        &self,
        q: &ChartQuery,
    ) -> Result<VisualizationData, FetchError> {
        let records = self.provider.records(&q.source).await?;
        let data = q.spec.aggregate(&records);
        debug!(
            visualization = %q.visualization,
            kind = q.spec.kind().tag(),
            rows = records.rows.len(),
            columns = records.columns.len(),
            points = data.len(),
            "visualization data fetched"
        );
        Ok(data)
    }

    /// Fetches layers one at a time, in list order.
    ///
    /// `is_visible` is consulted right before each fetch, so a layer hidden
    /// while an earlier one is in flight is skipped. Each fetch resolves
    /// before the next starts; a failure is reported to `on_result` and the
    /// loop moves on.
    pub async fn fetch_all_visible<G, F>(
        &self,
        layers: &[LayerQuery],
        mut is_visible: G,
        mut on_result: F,
    ) where
        G: FnMut(&LayerQuery) -> bool,
        F: FnMut(&LayerQuery, Result<FeatureCollection, FetchError>),
    {
        for q in layers {
            if !is_visible(q) {
                debug!(layer = %q.layer, "layer hidden before fetch, skipped");
                continue;
            }
            let result = self.fetch_layer(q).await;
            on_result(q, result);
        }
    }

    /// Sequential counterpart of [`Orchestrator::fetch_all_visible`] for charts.
    pub async fn fetch_all_visualizations<F>(&self, charts: &[ChartQuery], mut on_result: F)
    where
        F: FnMut(&ChartQuery, Result<VisualizationData, FetchError>),
    {
        for q in charts {
            let result = self.fetch_visualization(q).await;
            on_result(q, result);
        }
    }
}
