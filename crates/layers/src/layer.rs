use compute::Statistics;
use foundation::geo::LonLat;
use formats::properties::Properties;
use formats::{Feature, FeatureCollection};
use serde::Serialize;
use tracing::debug;

use crate::choropleth::hex_cells;
use crate::primitives::{HeatSample, PointMark, Primitives, Segment};
use crate::symbology::{HeatStyle, HexStyle, LineStyle, ScatterStyle, red_green};

/// Map layer kinds the engine knows how to draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Scatter,
    Heatmap,
    ChoroplethHex,
    Line,
}

impl LayerKind {
    /// Resolves a config type tag, including the aliases older view
    /// documents use.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "scatter" | "scatterplot" | "point" => Some(Self::Scatter),
            "heatmap" => Some(Self::Heatmap),
            "choropleth-hex" | "hexagon" | "h3" => Some(Self::ChoroplethHex),
            "line" => Some(Self::Line),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Heatmap => "heatmap",
            Self::ChoroplethHex => "choropleth-hex",
            Self::Line => "line",
        }
    }
}

/// A layer kind with its styling resolved from `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    Scatter(ScatterStyle),
    Heatmap(HeatStyle),
    ChoroplethHex(HexStyle),
    Line(LineStyle),
}

impl LayerSpec {
    pub fn from_properties(kind: LayerKind, props: &Properties) -> Self {
        match kind {
            LayerKind::Scatter => Self::Scatter(ScatterStyle::from_properties(props)),
            LayerKind::Heatmap => Self::Heatmap(HeatStyle::from_properties(props)),
            LayerKind::ChoroplethHex => Self::ChoroplethHex(HexStyle::from_properties(props)),
            LayerKind::Line => Self::Line(LineStyle::from_properties(props)),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Scatter(_) => LayerKind::Scatter,
            Self::Heatmap(_) => LayerKind::Heatmap,
            Self::ChoroplethHex(_) => LayerKind::ChoroplethHex,
            Self::Line(_) => LayerKind::Line,
        }
    }

    /// Turns fetched features into renderer primitives. Features lacking the
    /// geometry a kind needs are skipped.
    pub fn build(&self, data: &FeatureCollection) -> Primitives {
        let features = &data.features;
        let built = match self {
            Self::Scatter(style) => Primitives::Points(scatter(features, style)),
            Self::Heatmap(style) => Primitives::Heat {
                samples: features
                    .iter()
                    .filter_map(|f| {
                        Some(HeatSample {
                            position: position(f, style.position_field.as_deref())?,
                            weight: f.number(&style.weight_field).unwrap_or(1.0),
                        })
                    })
                    .collect(),
                intensity: style.intensity,
                threshold: style.threshold,
                radius_pixels: style.radius_pixels,
            },
            Self::ChoroplethHex(style) => Primitives::Hexes(hex_cells(features, style)),
            Self::Line(style) => Primitives::Lines(segments(features, style)),
        };
        let skipped = features.len().saturating_sub(built.len());
        if skipped > 0 {
            debug!(kind = self.kind().tag(), skipped, "features without usable geometry");
        }
        built
    }
}

fn position(f: &Feature, field: Option<&str>) -> Option<LonLat> {
    if let Some(field) = field {
        return f.attribute(field).and_then(LonLat::from_json);
    }
    f.point()
        .or_else(|| f.attribute("start_point").and_then(LonLat::from_json))
}

fn scatter(features: &[Feature], style: &ScatterStyle) -> Vec<PointMark> {
    let range = style.color_field.as_deref().and_then(|field| {
        let values: Vec<f64> = features.iter().filter_map(|f| f.number(field)).collect();
        Statistics::min_max(&values)
    });

    features
        .iter()
        .filter_map(|f| {
            let position = position(f, style.position_field.as_deref())?;
            let color = match (style.color_field.as_deref(), range) {
                (Some(field), Some((lo, hi))) => match f.number(field) {
                    Some(v) if hi > lo => red_green((v - lo) / (hi - lo)),
                    Some(_) => red_green(1.0),
                    None => style.color,
                },
                _ => style.color,
            };
            Some(PointMark {
                position,
                radius: style.radius,
                color,
            })
        })
        .collect()
}

fn segments(features: &[Feature], style: &LineStyle) -> Vec<Segment> {
    let mut out = Vec::new();
    for f in features {
        let source = f.attribute(&style.source_field).and_then(LonLat::from_json);
        let target = f.attribute(&style.target_field).and_then(LonLat::from_json);
        if let (Some(source), Some(target)) = (source, target) {
            out.push(Segment {
                source,
                target,
                color: style.color,
                width: style.width,
            });
            continue;
        }
        if let Some(path) = f.line_string() {
            out.extend(path.windows(2).map(|w| Segment {
                source: w[0],
                target: w[1],
                color: style.color,
                width: style.width,
            }));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{LayerKind, LayerSpec};
    use crate::primitives::Primitives;
    use foundation::geo::LonLat;
    use formats::FeatureCollection;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    fn spec(kind: LayerKind, props: serde_json::Value) -> LayerSpec {
        LayerSpec::from_properties(kind, props.as_object().unwrap_or(&Map::new()))
    }

    #[test]
    fn tags_and_aliases_resolve() {
        assert_eq!(LayerKind::from_tag("scatterplot"), Some(LayerKind::Scatter));
        assert_eq!(LayerKind::from_tag("point"), Some(LayerKind::Scatter));
        assert_eq!(LayerKind::from_tag("hexagon"), Some(LayerKind::ChoroplethHex));
        assert_eq!(LayerKind::from_tag("h3"), Some(LayerKind::ChoroplethHex));
        assert_eq!(LayerKind::from_tag("arc"), None);
        assert_eq!(LayerKind::ChoroplethHex.tag(), "choropleth-hex");
    }

    #[test]
    fn scatter_colors_by_field() {
        let fc = FeatureCollection::from_value(json!([
            {"coordinates": {"longitude": 1.0, "latitude": 2.0}, "properties": {"speed": 0}},
            {"coordinates": {"longitude": 3.0, "latitude": 4.0}, "properties": {"speed": 10}},
            {"coordinates": {"longitude": 5.0, "latitude": 6.0}, "properties": {}},
            {"properties": {"speed": 5}}
        ]))
        .unwrap();
        let Primitives::Points(points) = spec(LayerKind::Scatter, json!({"color_field": "speed"})).build(&fc)
        else {
            panic!("expected points");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].color, [255, 0, 0, 255]);
        assert_eq!(points[1].color, [0, 255, 0, 255]);
        assert_eq!(points[2].color, [0, 128, 255, 255]);
        assert_eq!(points[1].position, LonLat::new(3.0, 4.0));
    }

    #[test]
    fn heatmap_weights_default_to_one() {
        let fc = FeatureCollection::from_value(json!([
            {"start_point": [1.0, 2.0], "congestion_level": 0.5},
            {"start_point": [3.0, 4.0]}
        ]))
        .unwrap();
        let built = spec(LayerKind::Heatmap, json!({"weight_field": "congestion_level"})).build(&fc);
        let Primitives::Heat { samples, radius_pixels, .. } = built else {
            panic!("expected heat samples");
        };
        assert_eq!(radius_pixels, 60.0);
        let weights: Vec<_> = samples.iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![0.5, 1.0]);
    }

    #[test]
    fn lines_use_endpoints_then_linestrings() {
        let fc = FeatureCollection::from_value(json!([
            {"start_point": [0.0, 0.0], "end_point": [1.0, 1.0]},
            {"geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 0], [1, 1]]}},
            {"start_point": [0.0, 0.0]}
        ]))
        .unwrap();
        let Primitives::Lines(segs) = spec(LayerKind::Line, json!({"width": 4})).build(&fc) else {
            panic!("expected segments");
        };
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].width, 4.0);
        assert_eq!(segs[0].color, [255, 0, 0, 255]);
        assert_eq!(segs[2].source, LonLat::new(1.0, 0.0));
        assert_eq!(segs[2].target, LonLat::new(1.0, 1.0));
    }
}
