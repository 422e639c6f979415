use std::collections::HashMap;
use std::sync::Arc;

use foundation::ids::SourceId;
use formats::ColumnMetadata;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::provider::{DataError, DataProvider};

type Slot = Arc<OnceCell<Arc<Vec<ColumnMetadata>>>>;

/// Column metadata per data source, filled on first use.
///
/// Concurrent lookups for the same source share a single provider request.
/// A failed request leaves the slot empty so the next lookup retries. Entries
/// are never evicted; a fresh cache is built for every resolved view.
#[derive(Debug, Default)]
pub struct ColumnCache {
    slots: Mutex<HashMap<SourceId, Slot>>,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch(
        &self,
        source: &SourceId,
        provider: &dyn DataProvider,
    ) -> Result<Arc<Vec<ColumnMetadata>>, DataError> {
        let slot = self.slots.lock().entry(source.clone()).or_default().clone();
        let columns = slot
            .get_or_try_init(|| async {
                debug!(source = %source, "fetching column metadata");
                provider.columns(source).await.map(Arc::new)
            })
            .await?;
        Ok(columns.clone())
    }

    /// Cached metadata, without fetching.
    pub fn get(&self, source: &SourceId) -> Option<Arc<Vec<ColumnMetadata>>> {
        self.slots.lock().get(source)?.get().cloned()
    }

    /// Number of sources with metadata in hand.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|s| s.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
