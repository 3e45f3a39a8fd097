//! Multi-series robust statistics: per-series median and median-absolute-
//! deviation over a rolling time window.

use crate::time::Timestamp;
use statrs::statistics::Statistics;
use std::collections::{HashMap, VecDeque};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeriesStats {
    pub median: f64,
    pub mad: f64,
    pub z: f64,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct Series {
    window_sec: f64,
    points: VecDeque<(Timestamp, f64)>,
}

impl Series {
    fn new(window_sec: f64) -> Self {
        Self {
            window_sec,
            points: VecDeque::new(),
        }
    }

    fn evict(&mut self, now: Timestamp) {
        let cutoff = now - self.window_sec;
        while let Some(&(ts, _)) = self.points.front() {
            if ts < cutoff {
                self.points.pop_front();
            } else {
                break;
            }
        }
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Per-named-series rolling median/MAD tracker. Series are independent and
/// created lazily on first `update`.
#[derive(Debug, Clone, Default)]
pub struct RollingMad {
    series: HashMap<String, Series>,
    default_window_sec: f64,
}

impl RollingMad {
    pub fn new(default_window_sec: f64) -> Self {
        Self {
            series: HashMap::new(),
            default_window_sec,
        }
    }

    /// Appends a point to `series_name`'s history (creating it with the
    /// tracker's default window if new), evicts stale entries, and returns
    /// the resulting statistics including the z-score of the just-added
    /// value against the (post-eviction) window.
    pub fn update(&mut self, series_name: &str, timestamp: Timestamp, value: f64) -> SeriesStats {
        let default_window = self.default_window_sec;
        let series = self
            .series
            .entry(series_name.to_string())
            .or_insert_with(|| Series::new(default_window));
        series.points.push_back((timestamp, value));
        series.evict(timestamp);
        self.stats_for(series_name, value)
    }

    /// Current statistics for a series without mutating it, scoring
    /// `latest` as the probe value. Used by callers that want a z-score
    /// against the window without re-inserting a point.
    pub fn stats_for(&self, series_name: &str, latest: f64) -> SeriesStats {
        let Some(series) = self.series.get(series_name) else {
            return SeriesStats::default();
        };
        let mut values: Vec<f64> = series.points.iter().map(|&(_, v)| v).collect();
        let count = values.len();
        if count == 0 {
            return SeriesStats::default();
        }
        let med = median(&mut values.clone());
        let abs_devs: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
        let mad = median(&mut abs_devs.clone());
        let z = if mad == 0.0 || count < 2 {
            0.0
        } else {
            (latest - med).abs() / (1.4826 * mad + EPS)
        };
        let mean = values.clone().mean();
        let std = if count > 1 { values.std_dev() } else { 0.0 };
        SeriesStats {
            median: med,
            mad,
            z,
            mean,
            std,
            count,
        }
    }

    /// Most recent raw value recorded for a series, if any.
    pub fn latest(&self, series_name: &str) -> Option<f64> {
        self.series
            .get(series_name)
            .and_then(|s| s.points.back())
            .map(|&(_, v)| v)
    }
}
