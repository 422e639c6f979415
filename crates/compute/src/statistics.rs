pub struct Statistics;

impl Statistics {
    pub fn sum(values: &[f64]) -> f64 {
        values.iter().sum()
    }

    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(Self::sum(values) / values.len() as f64)
    }

    /// Ignores NaN.
    pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
        let mut it = values.iter().copied().filter(|v| !v.is_nan());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn max(values: &[f64]) -> Option<f64> {
        Self::min_max(values).map(|(_, hi)| hi)
    }
}
