//! Record aggregation behind the chart panels.
//!
//! A record contributes only when its group (or x) field is present and
//! non-null and its value field is a JSON number. Groups keep first-seen
//! order; a group with no contributing record is never emitted.

use serde_json::{Map, Value};

use crate::statistics::Statistics;

pub type Record = Map<String, Value>;

/// One output group: the key as found in the data, and its aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Value,
    pub value: f64,
}

fn collect_groups(records: &[Record], group_field: &str, value_field: &str) -> Vec<(Value, Vec<f64>)> {
    let mut groups: Vec<(Value, Vec<f64>)> = Vec::new();
    for r in records {
        let Some(key) = r.get(group_field).filter(|k| !k.is_null()) else {
            continue;
        };
        let Some(v) = r.get(value_field).and_then(Value::as_f64) else {
            continue;
        };
        match groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, vs)) => vs.push(v),
            None => groups.push((key.clone(), vec![v])),
        }
    }
    groups
}

/// Per-group sum of `value_field`.
pub fn group_sum(records: &[Record], group_field: &str, value_field: &str) -> Vec<Group> {
    collect_groups(records, group_field, value_field)
        .into_iter()
        .map(|(key, vs)| Group {
            key,
            value: Statistics::sum(&vs),
        })
        .collect()
}

/// Per-group arithmetic mean of `value_field`.
pub fn group_mean(records: &[Record], group_field: &str, value_field: &str) -> Vec<Group> {
    collect_groups(records, group_field, value_field)
        .into_iter()
        .filter_map(|(key, vs)| Some(Group {
            key,
            value: Statistics::mean(&vs)?,
        }))
        .collect()
}

/// Paired `(x, y)` series in encounter order, no sorting.
pub fn series(records: &[Record], x_field: &str, y_field: &str) -> (Vec<Value>, Vec<f64>) {
    records
        .iter()
        .filter_map(|r| {
            let x = r.get(x_field).filter(|x| !x.is_null())?;
            let y = r.get(y_field).and_then(Value::as_f64)?;
            Some((x.clone(), y))
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::{Group, Record, group_mean, group_sum, series};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn rows(v: Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn sample() -> Vec<Record> {
        rows(json!([{"g": "A", "v": 3}, {"g": "B", "v": 2}, {"g": "A", "v": 1}]))
    }

    #[test]
    fn pie_sums_in_first_seen_order() {
        assert_eq!(
            group_sum(&sample(), "g", "v"),
            vec![
                Group { key: json!("A"), value: 4.0 },
                Group { key: json!("B"), value: 2.0 },
            ]
        );
    }

    #[test]
    fn bar_averages_in_first_seen_order() {
        assert_eq!(
            group_mean(&sample(), "g", "v"),
            vec![
                Group { key: json!("A"), value: 2.0 },
                Group { key: json!("B"), value: 2.0 },
            ]
        );
    }

    #[test]
    fn groups_without_numeric_values_are_omitted() {
        let data = rows(json!([
            {"g": "A", "v": "n/a"},
            {"g": "B", "v": 4},
            {"g": null, "v": 1},
            {"v": 1}
        ]));
        let out = group_mean(&data, "g", "v");
        assert_eq!(out, vec![Group { key: json!("B"), value: 4.0 }]);
        assert!(out.iter().all(|g| g.value.is_finite()));
    }

    #[test]
    fn series_keeps_encounter_order() {
        let data = rows(json!([
            {"t": "2024-01-02", "y": 5},
            {"t": "2024-01-01", "y": 7},
            {"t": "2024-01-03"},
            {"t": "2024-01-04", "y": 1.5}
        ]));
        let (x, y) = series(&data, "t", "y");
        assert_eq!(x, vec![json!("2024-01-02"), json!("2024-01-01"), json!("2024-01-04")]);
        assert_eq!(y, vec![5.0, 7.0, 1.5]);
    }
}
