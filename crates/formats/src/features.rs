use foundation::geo::LonLat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FormatError;

/// One feature as served by the data provider.
///
/// Providers are loose about shape: GeoJSON features keep attributes under
/// `properties`, aggregated cells (`{hex, value, point_count}`) and segment
/// records (`{start_point, end_point, ...}`) keep them at the top level. The
/// raw object is kept and accessors look in both places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(Map<String, Value>);

impl Feature {
    pub fn new(raw: Map<String, Value>) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    /// Looks up an attribute in `properties` first, then at the top level.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.properties()
            .and_then(|p| p.get(name))
            .or_else(|| self.0.get(name))
    }

    /// Numeric attribute; only JSON numbers count.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(Value::as_f64)
    }

    /// Point position from GeoJSON `Point` geometry, a `{longitude, latitude}`
    /// `coordinates` object, or a `position` array.
    pub fn point(&self) -> Option<LonLat> {
        if let Some(geom) = self.0.get("geometry").and_then(Value::as_object) {
            if geom.get("type").and_then(Value::as_str) == Some("Point") {
                return geom.get("coordinates").and_then(LonLat::from_json);
            }
            return None;
        }
        if let Some(c) = self.0.get("coordinates").and_then(Value::as_object) {
            let lon = c.get("longitude").and_then(Value::as_f64)?;
            let lat = c.get("latitude").and_then(Value::as_f64)?;
            return Some(LonLat::new(lon, lat));
        }
        self.attribute("position").and_then(LonLat::from_json)
    }

    /// Vertices of a GeoJSON `LineString` geometry.
    pub fn line_string(&self) -> Option<Vec<LonLat>> {
        let geom = self.0.get("geometry").and_then(Value::as_object)?;
        if geom.get("type").and_then(Value::as_str) != Some("LineString") {
            return None;
        }
        let coords = geom.get("coordinates")?.as_array()?;
        Some(coords.iter().filter_map(LonLat::from_json).collect())
    }

    /// The attribute map a filter or aggregation sees.
    pub fn into_record(self) -> Map<String, Value> {
        let mut raw = self.0;
        match raw.remove("properties") {
            Some(Value::Object(props)) => props,
            Some(other) => {
                raw.insert("properties".to_string(), other);
                raw
            }
            None => raw,
        }
    }
}

/// Layer payload: the result of a filtered query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureCollection {
    /// `FeatureCollection`, `H3Collection`, ...; informational only.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: Some("FeatureCollection".to_string()),
            features,
        }
    }

    /// Accepts `{type?, features: [...]}` or a bare array of features.
    /// Non-object entries are skipped.
    pub fn from_value(v: Value) -> Result<Self, FormatError> {
        match v {
            Value::Array(items) => Ok(Self {
                kind: None,
                features: objects(items).map(Feature).collect(),
            }),
            Value::Object(mut obj) => {
                let kind = obj
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                match obj.remove("features") {
                    Some(Value::Array(items)) => Ok(Self {
                        kind,
                        features: objects(items).map(Feature).collect(),
                    }),
                    _ => Err(FormatError::UnexpectedShape(
                        "object without a `features` array".to_string(),
                    )),
                }
            }
            other => Err(FormatError::UnexpectedShape(format!(
                "expected feature collection, got {}",
                type_name(&other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Normalized `GET /data/{source}` payload.
///
/// `rows` holds record-shaped data. `columns` holds columnar series
/// (`{timestamps: [..], volume: [..]}`) and keyed distributions
/// (`{High: 150, Low: 420}`), which sources serve under `data` or
/// `metadata` instead of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub rows: Vec<Map<String, Value>>,
    pub columns: Map<String, Value>,
}

impl RecordSet {
    pub fn from_rows(rows: Vec<Map<String, Value>>) -> Self {
        Self {
            rows,
            columns: Map::new(),
        }
    }

    /// Accepts a bare array of records, `{data: [...]}`, `{records: [...]}`,
    /// a feature collection (rows are the features' attributes), columnar
    /// objects under `data` or `metadata`, or a bare columnar object.
    pub fn from_value(v: Value) -> Result<Self, FormatError> {
        let mut obj = match v {
            Value::Array(items) => return Ok(Self::from_rows(objects(items).collect())),
            Value::Object(obj) => obj,
            other => {
                return Err(FormatError::UnexpectedShape(format!(
                    "expected records, got {}",
                    type_name(&other)
                )));
            }
        };

        let mut set = Self::default();
        let mut recognized = false;
        for key in ["data", "records"] {
            match obj.remove(key) {
                Some(Value::Array(items)) => {
                    set.rows.extend(objects(items));
                    recognized = true;
                }
                Some(Value::Object(cols)) => {
                    set.columns.extend(cols);
                    recognized = true;
                }
                _ => {}
            }
        }
        // `metadata` series win over same-named `data` columns.
        if let Some(Value::Object(cols)) = obj.remove("metadata") {
            set.columns.extend(cols);
            recognized = true;
        }
        if obj.contains_key("features") {
            let fc = FeatureCollection::from_value(Value::Object(obj))?;
            set.rows
                .extend(fc.features.into_iter().map(Feature::into_record));
            return Ok(set);
        }
        if recognized {
            return Ok(set);
        }
        if obj.values().any(|v| v.is_array() || v.is_object()) {
            set.columns = obj;
            return Ok(set);
        }
        Err(FormatError::UnexpectedShape(
            "object without records or columnar series".to_string(),
        ))
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Zips same-index entries of columnar arrays into rows holding only
    /// `fields`. `None` unless every field is an array column; the shortest
    /// column bounds the row count.
    pub fn zip_columns(&self, fields: &[&str]) -> Option<Vec<Map<String, Value>>> {
        let arrays: Vec<&Vec<Value>> = fields
            .iter()
            .map(|f| self.columns.get(*f).and_then(Value::as_array))
            .collect::<Option<_>>()?;
        let len = arrays.iter().map(|a| a.len()).min().unwrap_or(0);
        Some(
            (0..len)
                .map(|i| {
                    fields
                        .iter()
                        .zip(&arrays)
                        .map(|(f, a)| (f.to_string(), a[i].clone()))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }
}

fn objects(items: Vec<Value>) -> impl Iterator<Item = Map<String, Value>> {
    items.into_iter().filter_map(|v| match v {
        Value::Object(o) => Some(o),
        _ => None,
    })
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
