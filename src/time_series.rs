use chrono::{DateTime, Utc};

/// One sample of a metric over time; `t` is seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, value: f64) -> Self {
        Self { t, value }
    }

    pub fn at(when: DateTime<Utc>, value: f64) -> Self {
        Self {
            t: when.timestamp_millis() as f64 / 1000.0,
            value,
        }
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        TimeSeriesPoint { t: v.0, value: v.1 }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.value)
    }
}

/// Values of a series in chronological order; ties keep their input order.
pub fn chronological_values(points: &[TimeSeriesPoint]) -> Vec<f64> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
    sorted.into_iter().map(|p| p.value).collect()
}
