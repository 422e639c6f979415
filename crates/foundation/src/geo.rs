use serde::Serialize;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Parses a `[lon, lat]` (or `[lon, lat, alt]`) JSON coordinate.
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        let arr = v.as_array()?;
        if arr.len() < 2 {
            return None;
        }
        let lon = arr[0].as_f64()?;
        let lat = arr[1].as_f64()?;
        Some(Self { lon, lat })
    }
}

/// Camera state handed to the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Viewport {
    /// Used whenever a view does not configure its own center or zoom.
    pub const DEFAULT: Viewport = Viewport {
        longitude: -122.4194,
        latitude: 37.7749,
        zoom: 12.0,
        pitch: 0.0,
        bearing: 0.0,
    };

    /// Builds the initial viewport, falling back field by field to
    /// [`Viewport::DEFAULT`].
    pub fn from_settings(center: Option<[f64; 2]>, zoom: Option<f64>) -> Self {
        let mut vp = Self::DEFAULT;
        if let Some([lon, lat]) = center
            && lon.is_finite()
            && lat.is_finite()
        {
            vp.longitude = lon;
            vp.latitude = lat;
        }
        if let Some(z) = zoom
            && z.is_finite()
            && z > 0.0
        {
            vp.zoom = z;
        }
        vp
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::{LonLat, Viewport};

    #[test]
    fn settings_override_default() {
        let vp = Viewport::from_settings(Some([2.35, 48.85]), Some(9.0));
        assert_eq!(vp.longitude, 2.35);
        assert_eq!(vp.latitude, 48.85);
        assert_eq!(vp.zoom, 9.0);
        assert_eq!(vp.pitch, 0.0);
    }

    #[test]
    fn missing_fields_fall_back_individually() {
        let vp = Viewport::from_settings(None, Some(4.0));
        assert_eq!(vp.longitude, Viewport::DEFAULT.longitude);
        assert_eq!(vp.zoom, 4.0);

        let vp = Viewport::from_settings(Some([1.0, 2.0]), Some(0.0));
        assert_eq!(vp.zoom, Viewport::DEFAULT.zoom);
    }

    #[test]
    fn parses_json_coordinates() {
        let v = serde_json::json!([-0.12, 51.5, 10.0]);
        assert_eq!(LonLat::from_json(&v), Some(LonLat::new(-0.12, 51.5)));
        assert_eq!(LonLat::from_json(&serde_json::json!([1.0])), None);
        assert_eq!(LonLat::from_json(&serde_json::json!("x")), None);
    }
}
