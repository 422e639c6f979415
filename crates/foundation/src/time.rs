use std::time::Duration;

/// Refresh period used when a view does not configure a usable one.
pub const DEFAULT_REFRESH_SECS: f64 = 30.0;

/// Bounds applied to configured refresh periods.
pub const MIN_REFRESH: Duration = Duration::from_millis(100);
pub const MAX_REFRESH: Duration = Duration::from_secs(24 * 60 * 60);

/// Normalizes a configured refresh rate (seconds) into a timer period.
///
/// Unset, non-positive and non-finite rates fall back to
/// [`DEFAULT_REFRESH_SECS`].
pub fn refresh_interval(rate_secs: Option<f64>) -> Duration {
    refresh_interval_or(rate_secs, Duration::from_secs_f64(DEFAULT_REFRESH_SECS))
}

/// Same as [`refresh_interval`] with a caller-chosen fallback.
///
/// Usable rates are clamped to [`MIN_REFRESH`]..=[`MAX_REFRESH`].
pub fn refresh_interval_or(rate_secs: Option<f64>, fallback: Duration) -> Duration {
    match rate_secs {
        Some(secs) if secs.is_finite() && secs > 0.0 => Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_REFRESH)
            .clamp(MIN_REFRESH, MAX_REFRESH),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_REFRESH, MIN_REFRESH, refresh_interval, refresh_interval_or};
    use std::time::Duration;

    #[test]
    fn uses_configured_rate() {
        assert_eq!(refresh_interval(Some(5.0)), Duration::from_secs(5));
        assert_eq!(refresh_interval(Some(0.5)), Duration::from_millis(500));
    }

    #[test]
    fn falls_back_to_default() {
        let default = Duration::from_secs(30);
        assert_eq!(refresh_interval(None), default);
        assert_eq!(refresh_interval(Some(0.0)), default);
        assert_eq!(refresh_interval(Some(-3.0)), default);
        assert_eq!(refresh_interval(Some(f64::NAN)), default);
    }

    #[test]
    fn custom_fallback() {
        let fallback = Duration::from_secs(7);
        assert_eq!(refresh_interval_or(Some(-1.0), fallback), fallback);
        assert_eq!(refresh_interval_or(Some(2.0), fallback), Duration::from_secs(2));
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        assert_eq!(refresh_interval(Some(1e20)), MAX_REFRESH);
        assert_eq!(refresh_interval(Some(f64::MAX)), MAX_REFRESH);
        assert_eq!(refresh_interval(Some(1e-12)), MIN_REFRESH);
    }
}
