use formats::properties::{Properties, f64_or, opt_str, rgba, rgba_or};
use serde::Serialize;
use serde_json::Value;

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Ordered color ramp for value-driven fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Palette(Vec<Rgba>);

impl Palette {
    pub fn new(colors: Vec<Rgba>) -> Self {
        Self(colors)
    }

    /// Six-step yellow to red ramp used when a hex layer names no palette.
    pub fn default_hex() -> Self {
        Self(vec![
            [255, 255, 178, 255],
            [254, 217, 118, 255],
            [254, 178, 76, 255],
            [253, 141, 60, 255],
            [240, 59, 32, 255],
            [189, 0, 38, 255],
        ])
    }

    /// Reads an array of colors; entries that are not colors are skipped.
    pub fn from_value(v: &Value) -> Option<Self> {
        let colors: Vec<Rgba> = v.as_array()?.iter().filter_map(rgba).collect();
        Some(Self(colors))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rgba> {
        self.0.get(index).copied()
    }
}

/// Red at `t = 0`, green at `t = 1`.
pub fn red_green(t: f64) -> Rgba {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    [
        (255.0 * (1.0 - t)).round() as u8,
        (255.0 * t).round() as u8,
        0,
        255,
    ]
}

/// Where point-like layers read positions from when the feature carries no
/// point geometry of its own.
fn position_field(props: &Properties) -> Option<String> {
    opt_str(props, "position_field").map(str::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterStyle {
    pub radius: f64,
    pub color: Rgba,
    pub color_field: Option<String>,
    pub position_field: Option<String>,
}

impl ScatterStyle {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            radius: f64_or(props, "radius", 5.0),
            color: rgba_or(props, "color", [0, 128, 255, 255]),
            color_field: opt_str(props, "color_field").map(str::to_string),
            position_field: position_field(props),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatStyle {
    pub weight_field: String,
    pub intensity: f64,
    pub threshold: f64,
    pub radius_pixels: f64,
    pub position_field: Option<String>,
}

impl HeatStyle {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            weight_field: opt_str(props, "weight_field")
                .unwrap_or("intensity")
                .to_string(),
            intensity: f64_or(props, "intensity", 1.0),
            threshold: f64_or(props, "threshold", 0.1),
            radius_pixels: f64_or(props, "radius_pixels", 60.0),
            position_field: position_field(props),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexStyle {
    pub hex_field: String,
    pub value_field: String,
    pub palette: Palette,
    pub elevation_scale: f64,
}

impl HexStyle {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            hex_field: opt_str(props, "hex_field").unwrap_or("hex").to_string(),
            value_field: opt_str(props, "value_field").unwrap_or("value").to_string(),
            palette: props
                .get("palette")
                .and_then(Palette::from_value)
                .unwrap_or_else(Palette::default_hex),
            elevation_scale: f64_or(props, "elevation_scale", 20.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub source_field: String,
    pub target_field: String,
    pub color: Rgba,
    pub width: f64,
}

impl LineStyle {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            source_field: opt_str(props, "source_field")
                .unwrap_or("start_point")
                .to_string(),
            target_field: opt_str(props, "target_field")
                .unwrap_or("end_point")
                .to_string(),
            color: rgba_or(props, "color", [255, 0, 0, 255]),
            width: f64_or(props, "width", 3.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HexStyle, Palette, ScatterStyle, red_green};
    use serde_json::{Map, json};

    #[test]
    fn ramp_endpoints() {
        assert_eq!(red_green(0.0), [255, 0, 0, 255]);
        assert_eq!(red_green(1.0), [0, 255, 0, 255]);
        assert_eq!(red_green(f64::NAN), [255, 0, 0, 255]);
        assert_eq!(red_green(7.0), [0, 255, 0, 255]);
    }

    #[test]
    fn styles_default_from_empty_properties() {
        let s = ScatterStyle::from_properties(&Map::new());
        assert_eq!(s.radius, 5.0);
        assert_eq!(s.color, [0, 128, 255, 255]);
        assert_eq!(s.color_field, None);

        let h = HexStyle::from_properties(&Map::new());
        assert_eq!(h.palette, Palette::default_hex());
        assert_eq!(h.palette.len(), 6);
        assert_eq!(h.elevation_scale, 20.0);
    }

    #[test]
    fn explicit_palette_replaces_default() {
        let props = json!({"palette": [[0, 0, 0], "bogus", [255, 255, 255, 128]]});
        let h = HexStyle::from_properties(props.as_object().unwrap());
        assert_eq!(
            h.palette,
            Palette::new(vec![[0, 0, 0, 255], [255, 255, 255, 128]])
        );
    }
}
