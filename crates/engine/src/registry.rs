//! The single place where config type tags become behavior.
//!
//! Unknown tags are logged and yield `None`; callers treat such entries as
//! inert: never fetched, rendered as nothing.

use compute::{ChartKind, ChartSpec};
use formats::{FeatureCollection, LayerConfig, VisualizationConfig};
use layers::{LayerKind, LayerSpec, Primitives};
use tracing::warn;

pub fn layer_spec(cfg: &LayerConfig) -> Option<LayerSpec> {
    match LayerKind::from_tag(&cfg.kind) {
        Some(kind) => Some(LayerSpec::from_properties(kind, &cfg.properties)),
        None => {
            warn!(layer = %cfg.id, tag = %cfg.kind, "unknown layer type; rendering nothing");
            None
        }
    }
}

pub fn chart_spec(cfg: &VisualizationConfig) -> Option<ChartSpec> {
    match ChartKind::from_tag(&cfg.kind) {
        Some(kind) => Some(ChartSpec::from_properties(kind, &cfg.properties)),
        None => {
            warn!(visualization = %cfg.id, tag = %cfg.kind, "unknown visualization type; rendering nothing");
            None
        }
    }
}

pub fn primitives(spec: Option<&LayerSpec>, data: Option<&FeatureCollection>) -> Primitives {
    match (spec, data) {
        (Some(spec), Some(data)) => spec.build(data),
        _ => Primitives::Empty,
    }
}
