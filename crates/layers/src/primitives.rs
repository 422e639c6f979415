use foundation::geo::LonLat;
use serde::Serialize;

use crate::symbology::Rgba;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMark {
    pub position: LonLat,
    pub radius: f64,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatSample {
    pub position: LonLat,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HexCell {
    pub hex: String,
    pub color: Rgba,
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub source: LonLat,
    pub target: LonLat,
    pub color: Rgba,
    pub width: f64,
}

/// Renderer-ready geometry for one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitives {
    Points(Vec<PointMark>),
    Heat {
        samples: Vec<HeatSample>,
        intensity: f64,
        threshold: f64,
        radius_pixels: f64,
    },
    Hexes(Vec<HexCell>),
    Lines(Vec<Segment>),
    /// Unknown layer kinds, and layers with no data yet.
    Empty,
}

impl Primitives {
    pub fn len(&self) -> usize {
        match self {
            Primitives::Points(p) => p.len(),
            Primitives::Heat { samples, .. } => samples.len(),
            Primitives::Hexes(h) => h.len(),
            Primitives::Lines(l) => l.len(),
            Primitives::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
