use render::{RenderFrame, RenderSink};
use tracing::{debug, info};

/// Stands in for a graphical renderer: logs a summary of every frame.
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSink for LogSink {
    fn present(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        let charts_ready = frame.charts.iter().filter(|c| c.data.is_some()).count();
        info!(
            frame = self.frames,
            view = %frame.view_id,
            epoch = %frame.epoch,
            layers = frame.layers.len(),
            primitives = frame.visible_primitives(),
            charts = frame.charts.len(),
            charts_ready,
            "frame"
        );
        for layer in frame.layers.iter().filter(|l| l.visible) {
            debug!(layer = %layer.id, name = %layer.name, primitives = layer.primitives.len(), "layer");
        }
        if let Some(hovered) = &frame.hovered {
            debug!(layer = %hovered.layer_id, feature = %hovered.feature, "hover");
        }
    }
}
