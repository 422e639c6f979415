use std::sync::Arc;

use compute::{ChartKind, VisualizationData};
use foundation::geo::Viewport;
use foundation::ids::{Epoch, LayerId, ViewId, VisualizationId};
use layers::{LayerKind, Primitives};
use serde::Serialize;
use serde_json::Value;

/// Hover/pick report from the renderer. `feature` is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerEvent {
    pub layer_id: LayerId,
    pub feature: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderLayer {
    pub id: LayerId,
    pub name: String,
    /// `None` for layer types the engine does not know; such layers carry
    /// [`Primitives::Empty`].
    pub kind: Option<LayerKind>,
    pub visible: bool,
    pub primitives: Arc<Primitives>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub id: VisualizationId,
    pub title: String,
    pub kind: Option<ChartKind>,
    /// `None` until the first successful fetch.
    pub data: Option<Arc<VisualizationData>>,
}

/// Complete description of what should be on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub epoch: Epoch,
    pub view_id: ViewId,
    pub viewport: Viewport,
    /// Config order.
    pub layers: Vec<RenderLayer>,
    pub charts: Vec<ChartPanel>,
    pub hovered: Option<PointerEvent>,
}

impl RenderFrame {
    pub fn layer(&self, id: &str) -> Option<&RenderLayer> {
        self.layers.iter().find(|l| l.id.as_str() == id)
    }

    pub fn chart(&self, id: &str) -> Option<&ChartPanel> {
        self.charts.iter().find(|c| c.id.as_str() == id)
    }

    /// Primitives the renderer will actually draw.
    pub fn visible_primitives(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.primitives.len())
            .sum()
    }
}
