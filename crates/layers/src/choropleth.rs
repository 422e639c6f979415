use compute::Statistics;
use formats::Feature;

use crate::primitives::HexCell;
use crate::symbology::{HexStyle, TRANSPARENT};

/// Palette index for `value` scaled against `max`.
///
/// `floor(value / max * (len - 1))`, clamped to the palette. `None` means the
/// cell is drawn transparent: no numeric value or an empty palette.
pub fn color_index(value: Option<f64>, max: f64, palette_len: usize) -> Option<usize> {
    let value = value.filter(|v| v.is_finite())?;
    if palette_len == 0 {
        return None;
    }
    let last = palette_len - 1;
    if !max.is_finite() || max <= 0.0 {
        return Some(0);
    }
    let scaled = (value / max * last as f64).floor();
    if scaled <= 0.0 {
        return Some(0);
    }
    Some((scaled as usize).min(last))
}

fn hex_id(feature: &Feature, style: &HexStyle) -> Option<String> {
    feature
        .attribute(&style.hex_field)
        .or_else(|| feature.attribute("h3_index"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Colors and extrudes hex cells. Features without a cell id are skipped.
pub fn hex_cells(features: &[Feature], style: &HexStyle) -> Vec<HexCell> {
    let values: Vec<f64> = features
        .iter()
        .filter_map(|f| f.number(&style.value_field))
        .collect();
    let max = Statistics::max(&values).unwrap_or(0.0);

    features
        .iter()
        .filter_map(|f| {
            let hex = hex_id(f, style)?;
            let value = f.number(&style.value_field);
            let color = color_index(value, max, style.palette.len())
                .and_then(|i| style.palette.get(i))
                .unwrap_or(TRANSPARENT);
            let elevation = value
                .filter(|v| v.is_finite())
                .map_or(0.0, |v| v * style.elevation_scale);
            Some(HexCell {
                hex,
                color,
                elevation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{color_index, hex_cells};
    use crate::symbology::{HexStyle, Palette, TRANSPARENT};
    use formats::FeatureCollection;
    use serde_json::{Map, json};

    #[test]
    fn index_follows_floor_of_scaled_value() {
        assert_eq!(color_index(Some(40.0), 40.0, 5), Some(4));
        assert_eq!(color_index(Some(20.0), 40.0, 5), Some(2));
        assert_eq!(color_index(Some(10.0), 40.0, 5), Some(1));
        assert_eq!(color_index(None, 40.0, 5), None);
    }

    #[test]
    fn index_is_clamped() {
        assert_eq!(color_index(Some(-5.0), 40.0, 5), Some(0));
        assert_eq!(color_index(Some(80.0), 40.0, 5), Some(4));
        assert_eq!(color_index(Some(3.0), 0.0, 5), Some(0));
        assert_eq!(color_index(Some(3.0), 10.0, 0), None);
        assert_eq!(color_index(Some(f64::NAN), 10.0, 3), None);
    }

    #[test]
    fn non_numeric_cells_are_transparent() {
        let palette: Vec<[u8; 4]> = (0..5u8).map(|i| [i, i, i, 255]).collect();
        let mut style = HexStyle::from_properties(&Map::new());
        style.palette = Palette::new(palette);

        let fc = FeatureCollection::from_value(json!([
            {"hex": "a", "value": 10},
            {"hex": "b", "value": 20},
            {"hex": "c", "value": 40},
            {"hex": "d", "value": "high"},
            {"h3_index": "e", "value": 40},
            {"value": 1}
        ]))
        .unwrap();
        let cells = hex_cells(&fc.features, &style);

        let ids: Vec<_> = cells.iter().map(|c| c.hex.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(cells[0].color, [1, 1, 1, 255]);
        assert_eq!(cells[1].color, [2, 2, 2, 255]);
        assert_eq!(cells[2].color, [4, 4, 4, 255]);
        assert_eq!(cells[3].color, TRANSPARENT);
        assert_eq!(cells[3].elevation, 0.0);
        assert_eq!(cells[2].elevation, 800.0);
    }
}
