use std::collections::BTreeSet;

use foundation::geo::LonLat;
use foundation::ids::{LayerId, SourceId, ViewId, VisualizationId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::FormatError;

/// Wire shape of `GET /views/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewDocument {
    pub id: ViewId,
    pub config: ViewBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<f64>,
}

/// The `config` object of a view document, before validation.
///
/// `components` and `settings` are optional here so that their absence can be
/// reported as a malformed document rather than a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewBody {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub data_sources: Vec<DataSourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSourceRef {
    pub id: SourceId,
    #[serde(rename = "type")]
    pub kind: String,
    // Connector-specific fields (bucket, path, query, ...), opaque to the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Seconds between visualization refreshes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_zoom: Option<f64>,
    /// `[lon, lat]`; an altitude, if present, is dropped. Unusable shapes
    /// decode as `None` so the default viewport applies.
    #[serde(
        default,
        deserialize_with = "lenient_center",
        skip_serializing_if = "Option::is_none"
    )]
    pub center: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Map {
        #[serde(default)]
        layers: Vec<LayerConfig>,
    },
    Grid {
        #[serde(default)]
        visualizations: Vec<VisualizationConfig>,
    },
    /// Any component kind the engine does not drive (headers, selectors, ...).
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerConfig {
    pub id: LayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Open-ended type tag; resolved by the registry.
    #[serde(rename = "type")]
    pub kind: String,
    pub data_source: SourceId,
    /// Initial visibility.
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

impl LayerConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisualizationConfig {
    pub id: VisualizationId,
    #[serde(rename = "type")]
    pub kind: String,
    pub data_source: SourceId,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

/// Entry of `GET /views`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A validated view configuration. Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub id: ViewId,
    pub name: String,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub data_sources: Vec<DataSourceRef>,
    pub components: Vec<Component>,
    pub settings: Settings,
    pub last_updated: Option<f64>,
}

impl ViewConfig {
    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        let doc: ViewDocument = serde_json::from_str(text)?;
        Self::from_document(doc)
    }

    /// Validates a raw document.
    ///
    /// Fails when `settings` or `components` is missing, or when layer or
    /// visualization ids repeat within the view.
    pub fn from_document(doc: ViewDocument) -> Result<Self, FormatError> {
        let body = doc.config;
        let components = body.components.ok_or(FormatError::MissingField("components"))?;
        let settings = body.settings.ok_or(FormatError::MissingField("settings"))?;

        let config = Self {
            id: doc.id,
            name: body.name,
            kind: body.kind,
            description: body.description,
            data_sources: body.data_sources,
            components,
            settings,
            last_updated: doc.last_updated,
        };

        let mut seen = BTreeSet::new();
        for layer in config.layers() {
            if !seen.insert(layer.id.as_str()) {
                return Err(FormatError::DuplicateId {
                    kind: "layer",
                    id: layer.id.to_string(),
                });
            }
        }
        let mut seen = BTreeSet::new();
        for vis in config.visualizations() {
            if !seen.insert(vis.id.as_str()) {
                return Err(FormatError::DuplicateId {
                    kind: "visualization",
                    id: vis.id.to_string(),
                });
            }
        }

        Ok(config)
    }

    /// Layers of every map component, in document order.
    pub fn layers(&self) -> impl Iterator<Item = &LayerConfig> {
        self.components.iter().flat_map(|c| match c {
            Component::Map { layers } => layers.as_slice(),
            _ => &[][..],
        })
    }

    /// Visualizations of every grid component, in document order.
    pub fn visualizations(&self) -> impl Iterator<Item = &VisualizationConfig> {
        self.components.iter().flat_map(|c| match c {
            Component::Grid { visualizations } => visualizations.as_slice(),
            _ => &[][..],
        })
    }

    pub fn unsupported_components(&self) -> usize {
        self.components
            .iter()
            .filter(|c| matches!(c, Component::Unsupported))
            .count()
    }
}

fn default_true() -> bool {
    true
}

fn lenient_center<'de, D>(de: D) -> Result<Option<[f64; 2]>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(de)?;
    Ok(raw
        .as_ref()
        .and_then(LonLat::from_json)
        .map(|p| [p.lon, p.lat]))
}

fn null_as_empty<'de, D>(de: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(de)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{Component, FormatError, ViewConfig};
    use pretty_assertions::assert_eq;

    const TRAFFIC: &str = r#"{
        "id": "traffic",
        "config": {
            "name": "Traffic",
            "type": "dashboard",
            "description": "City traffic",
            "data_sources": [{"id": "roads", "type": "file", "path": "roads.csv"}],
            "components": [
                {"type": "header", "title": "ignored"},
                {"type": "map", "layers": [
                    {"id": "flow", "type": "line", "data_source": "roads", "properties": {"width": 4}},
                    {"id": "heat", "name": "Heat", "type": "heatmap", "data_source": "roads", "visible": false, "properties": null}
                ]},
                {"type": "grid", "visualizations": [
                    {"id": "volume", "type": "line", "data_source": "roads", "title": "Volume"}
                ]}
            ],
            "settings": {"refresh_rate": 5, "default_zoom": 11, "center": [-122.4, 37.7], "time_window": 3600}
        },
        "last_updated": 1700000000.5
    }"#;

    #[test]
    fn parses_full_document() {
        let cfg = ViewConfig::from_json(TRAFFIC).unwrap();
        assert_eq!(cfg.id.as_str(), "traffic");
        assert_eq!(cfg.name, "Traffic");
        assert_eq!(cfg.data_sources[0].kind, "file");
        assert_eq!(cfg.data_sources[0].extra["path"], "roads.csv");
        assert_eq!(cfg.settings.refresh_rate, Some(5.0));
        assert_eq!(cfg.settings.center, Some([-122.4, 37.7]));
        assert_eq!(cfg.unsupported_components(), 1);
        assert!(matches!(cfg.components[0], Component::Unsupported));

        let layers: Vec<_> = cfg.layers().collect();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].display_name(), "flow");
        assert!(layers[0].visible);
        assert_eq!(layers[1].display_name(), "Heat");
        assert!(!layers[1].visible);
        assert!(layers[1].properties.is_empty());

        let vis: Vec<_> = cfg.visualizations().collect();
        assert_eq!(vis[0].title, "Volume");
    }

    #[test]
    fn missing_settings_is_malformed() {
        let text = r#"{"id": "v", "config": {"name": "v", "components": []}}"#;
        let err = ViewConfig::from_json(text).unwrap_err();
        assert!(matches!(err, FormatError::MissingField("settings")));
    }

    #[test]
    fn missing_components_is_malformed() {
        let text = r#"{"id": "v", "config": {"name": "v", "settings": {}}}"#;
        let err = ViewConfig::from_json(text).unwrap_err();
        assert!(matches!(err, FormatError::MissingField("components")));
    }

    #[test]
    fn duplicate_layer_ids_are_rejected() {
        let text = r#"{"id": "v", "config": {"settings": {}, "components": [
            {"type": "map", "layers": [{"id": "a", "type": "line", "data_source": "s"}]},
            {"type": "map", "layers": [{"id": "a", "type": "heatmap", "data_source": "s"}]}
        ]}}"#;
        let err = ViewConfig::from_json(text).unwrap_err();
        assert!(matches!(err, FormatError::DuplicateId { kind: "layer", .. }));
    }

    #[test]
    fn empty_settings_are_accepted() {
        let text = r#"{"id": "v", "config": {"settings": {}, "components": []}}"#;
        let cfg = ViewConfig::from_json(text).unwrap();
        assert_eq!(cfg.settings.refresh_rate, None);
        assert_eq!(cfg.layers().count(), 0);
    }

    #[test]
    fn center_accepts_altitude_and_tolerates_bad_shapes() {
        let with = |center: &str| {
            let text = format!(
                r#"{{"id": "v", "config": {{"settings": {{"center": {center}}}, "components": []}}}}"#
            );
            ViewConfig::from_json(&text).unwrap().settings.center
        };
        assert_eq!(with("[-0.12, 51.5, 120.0]"), Some([-0.12, 51.5]));
        assert_eq!(with("[-0.12, 51.5]"), Some([-0.12, 51.5]));
        assert_eq!(with("[1.0]"), None);
        assert_eq!(with(r#""downtown""#), None);
        assert_eq!(with("null"), None);
    }
}
