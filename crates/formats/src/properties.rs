//! Typed reads from the open-ended `properties` object of layers and
//! visualizations. Wrong-typed values are treated as absent.

use serde_json::{Map, Value};

pub type Properties = Map<String, Value>;

pub fn str_or<'a>(props: &'a Properties, key: &str, default: &'a str) -> &'a str {
    props.get(key).and_then(Value::as_str).unwrap_or(default)
}

pub fn opt_str<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Finite number or `default`.
pub fn f64_or(props: &Properties, key: &str, default: f64) -> f64 {
    props
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// `[r, g, b]` or `[r, g, b, a]` with 0..=255 components.
pub fn rgba(v: &Value) -> Option<[u8; 4]> {
    let arr = v.as_array()?;
    if !(3..=4).contains(&arr.len()) {
        return None;
    }
    let mut out = [0, 0, 0, 255];
    for (slot, c) in out.iter_mut().zip(arr) {
        let c = c.as_f64()?;
        if !(0.0..=255.0).contains(&c) {
            return None;
        }
        *slot = c.round() as u8;
    }
    Some(out)
}

pub fn rgba_or(props: &Properties, key: &str, default: [u8; 4]) -> [u8; 4] {
    props.get(key).and_then(rgba).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::{f64_or, opt_str, rgba, rgba_or, str_or};
    use serde_json::json;

    #[test]
    fn typed_reads_fall_back_on_wrong_types() {
        let props = json!({"radius": "big", "width": 4, "mode": "lines", "field": ""});
        let props = props.as_object().unwrap();
        assert_eq!(f64_or(props, "radius", 5.0), 5.0);
        assert_eq!(f64_or(props, "width", 3.0), 4.0);
        assert_eq!(str_or(props, "mode", "markers"), "lines");
        assert_eq!(str_or(props, "missing", "markers"), "markers");
        assert_eq!(opt_str(props, "field"), None);
    }

    #[test]
    fn colors_accept_rgb_and_rgba() {
        assert_eq!(rgba(&json!([255, 0, 0])), Some([255, 0, 0, 255]));
        assert_eq!(rgba(&json!([0, 128, 255, 100])), Some([0, 128, 255, 100]));
        assert_eq!(rgba(&json!([0, 300, 0])), None);
        assert_eq!(rgba(&json!("red")), None);
        let props = json!({"color": [1, 2]});
        assert_eq!(
            rgba_or(props.as_object().unwrap(), "color", [9, 9, 9, 9]),
            [9, 9, 9, 9]
        );
    }
}
