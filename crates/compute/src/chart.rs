use std::borrow::Cow;

use formats::RecordSet;
use formats::properties::{Properties, str_or};
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{Record, group_mean, group_sum, series};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Pie,
    Bar,
}

impl ChartKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            "bar" => Some(Self::Bar),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Bar => "bar",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

impl Orientation {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "h" => Self::Horizontal,
            _ => Self::Vertical,
        }
    }
}

/// A chart kind with its field bindings resolved from `properties`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Line {
        x_field: String,
        y_field: String,
        mode: String,
    },
    Pie {
        labels_field: String,
        values_field: String,
    },
    Bar {
        x_field: String,
        y_field: String,
        orientation: Orientation,
    },
}

impl ChartSpec {
    pub fn from_properties(kind: ChartKind, props: &Properties) -> Self {
        match kind {
            ChartKind::Line => Self::Line {
                x_field: str_or(props, "x_field", "timestamp").to_string(),
                y_field: str_or(props, "y_field", "value").to_string(),
                mode: str_or(props, "mode", "lines+markers").to_string(),
            },
            ChartKind::Pie => Self::Pie {
                labels_field: str_or(props, "labels_field", "label").to_string(),
                values_field: str_or(props, "values_field", "value").to_string(),
            },
            ChartKind::Bar => Self::Bar {
                x_field: str_or(props, "x_field", "category").to_string(),
                y_field: str_or(props, "y_field", "value").to_string(),
                orientation: Orientation::from_tag(str_or(props, "orientation", "v")),
            },
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Line { .. } => ChartKind::Line,
            Self::Pie { .. } => ChartKind::Pie,
            Self::Bar { .. } => ChartKind::Bar,
        }
    }

    /// Builds fresh chart data from an unfiltered payload.
    ///
    /// Columnar series take precedence over rows when they carry both bound
    /// fields. A pie whose `values_field` names a `{label: value}` object
    /// reads its slices from that object in key order.
    pub fn aggregate(&self, data: &RecordSet) -> VisualizationData {
        match self {
            Self::Line {
                x_field,
                y_field,
                mode,
            } => {
                let (x, y) = series(&rows_for(data, x_field, y_field), x_field, y_field);
                VisualizationData::Series {
                    x,
                    y,
                    mode: mode.clone(),
                }
            }
            Self::Pie {
                labels_field,
                values_field,
            } => {
                let (labels, values): (Vec<Value>, Vec<f64>) = match data.column(values_field) {
                    Some(Value::Object(slices)) => slices
                        .iter()
                        .filter_map(|(k, v)| Some((Value::String(k.clone()), v.as_f64()?)))
                        .unzip(),
                    _ => {
                        let rows = rows_for(data, labels_field, values_field);
                        group_sum(&rows, labels_field, values_field)
                            .into_iter()
                            .map(|g| (g.key, g.value))
                            .unzip()
                    }
                };
                VisualizationData::Pie { labels, values }
            }
            Self::Bar {
                x_field,
                y_field,
                orientation,
            } => {
                let (x, y) = group_mean(&rows_for(data, x_field, y_field), x_field, y_field)
                    .into_iter()
                    .map(|g| (g.key, g.value))
                    .unzip();
                VisualizationData::Bar {
                    x,
                    y,
                    orientation: *orientation,
                }
            }
        }
    }
}

fn rows_for<'a>(data: &'a RecordSet, a: &str, b: &str) -> Cow<'a, [Record]> {
    match data.zip_columns(&[a, b]) {
        Some(rows) => Cow::Owned(rows),
        None => Cow::Borrowed(&data.rows),
    }
}

/// Chart-ready aggregate. Always replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualizationData {
    Series {
        x: Vec<Value>,
        y: Vec<f64>,
        mode: String,
    },
    Pie {
        labels: Vec<Value>,
        values: Vec<f64>,
    },
    Bar {
        x: Vec<Value>,
        y: Vec<f64>,
        orientation: Orientation,
    },
}

impl VisualizationData {
    pub fn len(&self) -> usize {
        match self {
            Self::Series { y, .. } | Self::Bar { y, .. } => y.len(),
            Self::Pie { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
