use std::collections::HashMap;
use std::sync::Arc;

use compute::{ChartSpec, VisualizationData};
use foundation::ids::{LayerId, VisualizationId};
use formats::{FeatureCollection, FilterDefinition, LayerConfig, VisualizationConfig};
use layers::{LayerSpec, Primitives};
use render::PointerEvent;
use streaming::ColumnCache;

use crate::registry;

/// Per-layer state for the lifetime of one resolved view.
#[derive(Debug, Clone)]
pub struct LayerRuntimeState {
    pub config: LayerConfig,
    /// `None` when the type tag is unknown.
    pub spec: Option<LayerSpec>,
    pub visible: bool,
    pub filters: Vec<FilterDefinition>,
    pub data: Option<Arc<FeatureCollection>>,
    pub primitives: Arc<Primitives>,
    /// Sequence of the last completion written to this slot.
    pub applied_seq: Option<u64>,
    pub last_error: Option<String>,
}

impl LayerRuntimeState {
    pub fn new(config: LayerConfig) -> Self {
        let spec = registry::layer_spec(&config);
        Self {
            visible: config.visible,
            config,
            spec,
            filters: Vec::new(),
            data: None,
            primitives: Arc::new(Primitives::Empty),
            applied_seq: None,
            last_error: None,
        }
    }

    pub fn id(&self) -> &LayerId {
        &self.config.id
    }

    /// Visible layers of a known kind are the only ones ever fetched.
    pub fn fetchable(&self) -> bool {
        self.visible && self.spec.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct VisualizationState {
    pub config: VisualizationConfig,
    pub spec: Option<ChartSpec>,
    pub data: Option<Arc<VisualizationData>>,
    pub applied_seq: Option<u64>,
    pub last_error: Option<String>,
}

impl VisualizationState {
    pub fn new(config: VisualizationConfig) -> Self {
        let spec = registry::chart_spec(&config);
        Self {
            config,
            spec,
            data: None,
            applied_seq: None,
            last_error: None,
        }
    }

    pub fn id(&self) -> &VisualizationId {
        &self.config.id
    }
}

/// Keyed runtime state of one view.
///
/// Every update replaces the whole `Arc` for its key, so holders of an old
/// `Arc` keep an unchanged value and `Arc::ptr_eq` detects change.
#[derive(Debug, Default)]
pub struct RuntimeStore {
    layers: Vec<Arc<LayerRuntimeState>>,
    layer_index: HashMap<LayerId, usize>,
    visualizations: Vec<Arc<VisualizationState>>,
    visualization_index: HashMap<VisualizationId, usize>,
    columns: Arc<ColumnCache>,
    hovered: Option<PointerEvent>,
}

impl RuntimeStore {
    pub fn new<'a>(
        layers: impl IntoIterator<Item = &'a LayerConfig>,
        visualizations: impl IntoIterator<Item = &'a VisualizationConfig>,
    ) -> Self {
        let mut store = Self::default();
        for cfg in layers {
            store
                .layer_index
                .insert(cfg.id.clone(), store.layers.len());
            store
                .layers
                .push(Arc::new(LayerRuntimeState::new(cfg.clone())));
        }
        for cfg in visualizations {
            store
                .visualization_index
                .insert(cfg.id.clone(), store.visualizations.len());
            store
                .visualizations
                .push(Arc::new(VisualizationState::new(cfg.clone())));
        }
        store
    }

    /// Layers in config order.
    pub fn layers(&self) -> &[Arc<LayerRuntimeState>] {
        &self.layers
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Arc<LayerRuntimeState>> {
        self.layer_index.get(id).map(|&i| &self.layers[i])
    }

    pub fn visualizations(&self) -> &[Arc<VisualizationState>] {
        &self.visualizations
    }

    pub fn visualization(&self, id: &VisualizationId) -> Option<&Arc<VisualizationState>> {
        self.visualization_index
            .get(id)
            .map(|&i| &self.visualizations[i])
    }

    /// Replaces the state of layer `id` with an edited copy.
    ///
    /// Returns `false` when no such layer exists.
    pub fn update_layer(&mut self, id: &LayerId, edit: impl FnOnce(&mut LayerRuntimeState)) -> bool {
        let Some(&i) = self.layer_index.get(id) else {
            return false;
        };
        let mut next = LayerRuntimeState::clone(&self.layers[i]);
        edit(&mut next);
        self.layers[i] = Arc::new(next);
        true
    }

    pub fn update_visualization(
        &mut self,
        id: &VisualizationId,
        edit: impl FnOnce(&mut VisualizationState),
    ) -> bool {
        let Some(&i) = self.visualization_index.get(id) else {
            return false;
        };
        let mut next = VisualizationState::clone(&self.visualizations[i]);
        edit(&mut next);
        self.visualizations[i] = Arc::new(next);
        true
    }

    pub fn column_cache(&self) -> &Arc<ColumnCache> {
        &self.columns
    }

    pub fn hovered(&self) -> Option<&PointerEvent> {
        self.hovered.as_ref()
    }

    pub fn set_hovered(&mut self, event: Option<PointerEvent>) {
        self.hovered = event;
    }
}
