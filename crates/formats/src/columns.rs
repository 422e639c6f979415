use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Columns with fewer distinct values than this are treated as categorical
/// even when numeric.
pub const CATEGORICAL_MAX_UNIQUE: usize = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Categorical,
    Numerical,
}

/// Describes one filterable column of a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ColumnMetadata {
    pub fn categorical(name: impl Into<String>, unique_values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Categorical,
            unique_values: Some(unique_values),
            min: None,
            max: None,
        }
    }

    pub fn numerical(name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Numerical,
            unique_values: None,
            min,
            max,
        }
    }
}

/// Derives column metadata from a set of records.
///
/// Columns appear in first-seen order. A column is numerical when every
/// non-null value is a number and it has at least [`CATEGORICAL_MAX_UNIQUE`]
/// distinct values; everything else is categorical.
pub fn infer_columns(records: &[Map<String, Value>]) -> Vec<ColumnMetadata> {
    let mut names: Vec<&str> = Vec::new();
    for r in records {
        for k in r.keys() {
            if !names.contains(&k.as_str()) {
                names.push(k.as_str());
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let mut uniques: Vec<&Value> = Vec::new();
            let mut all_numeric = true;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for v in records.iter().filter_map(|r| r.get(name)) {
                if v.is_null() {
                    continue;
                }
                match v.as_f64() {
                    Some(n) => {
                        min = min.min(n);
                        max = max.max(n);
                    }
                    None => all_numeric = false,
                }
                if !uniques.contains(&v) {
                    uniques.push(v);
                }
            }

            if all_numeric && uniques.len() >= CATEGORICAL_MAX_UNIQUE {
                ColumnMetadata::numerical(name, Some(min), Some(max))
            } else {
                ColumnMetadata::categorical(name, uniques.into_iter().cloned().collect())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ColumnType, infer_columns};
    use serde_json::{Map, Value, json};

    fn rows(v: Value) -> Vec<Map<String, Value>> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn infers_types_like_the_data_service() {
        let mut data = Vec::new();
        for i in 0..12 {
            let level = if i % 2 == 0 { "High" } else { "Low" };
            data.push(json!({"level": level, "speed": i * 10, "lane": i % 3}));
        }
        let cols = infer_columns(&rows(Value::Array(data)));

        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["level", "speed", "lane"]);

        assert_eq!(cols[0].column_type, ColumnType::Categorical);
        assert_eq!(cols[0].unique_values.as_ref().unwrap().len(), 2);

        assert_eq!(cols[1].column_type, ColumnType::Numerical);
        assert_eq!(cols[1].min, Some(0.0));
        assert_eq!(cols[1].max, Some(110.0));

        // Numeric but low-cardinality.
        assert_eq!(cols[2].column_type, ColumnType::Categorical);
    }

    #[test]
    fn metadata_wire_format() {
        let c: super::ColumnMetadata =
            serde_json::from_value(json!({"name": "speed", "type": "numerical", "min": 0, "max": 5}))
                .unwrap();
        assert_eq!(c.column_type, ColumnType::Numerical);
        assert_eq!(c.unique_values, None);
        assert_eq!(c.max, Some(5.0));
    }
}
