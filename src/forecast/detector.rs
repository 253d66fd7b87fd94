//! Peak hour detection with a small-sample guard

use super::profile::{HourlyProfileEntry, PeakForecastEntry};
use crate::config::ForecastConfig;
use std::cmp::Ordering;

pub struct PeakDetector {
    min_active_hours: usize,
}

impl PeakDetector {
    pub fn new(min_active_hours: usize) -> Self {
        Self { min_active_hours }
    }

    pub fn with_defaults() -> Self {
        Self::from_config(&ForecastConfig::default())
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.min_active_hours)
    }

    /// Classify the busiest active hours as peaks
    ///
    /// # Algorithm
    /// - Active hours: any orders or runs on average
    /// - Fewer than `min_active_hours` active hours → no forecast
    /// - Threshold: mean + population stddev of demand_score, or the max
    ///   score when every active hour scores the same
    /// - Peaks: active hours at or above the threshold, never empty once the
    ///   guard passes (falls back to the single best hour)
    ///
    /// # Ordering
    /// Descending demand_score, ties broken by ascending hour.
    pub fn forecast_peak_hours(&self, profile: &[HourlyProfileEntry]) -> Vec<PeakForecastEntry> {
        let active: Vec<&HourlyProfileEntry> = profile.iter().filter(|e| e.is_active()).collect();

        if active.is_empty() || active.len() < self.min_active_hours {
            log::debug!(
                "🔎 {} active hours (< {}), no peak forecast",
                active.len(),
                self.min_active_hours
            );
            return Vec::new();
        }

        let n = active.len() as f64;
        let mean = active.iter().map(|e| e.demand_score).sum::<f64>() / n;
        let stddev = if active.len() > 1 {
            let variance = active
                .iter()
                .map(|e| (e.demand_score - mean).powi(2))
                .sum::<f64>()
                / n;
            variance.sqrt()
        } else {
            0.0
        };
        let max_score = active
            .iter()
            .map(|e| e.demand_score)
            .fold(f64::NEG_INFINITY, f64::max);

        let threshold = if stddev > 0.0 { mean + stddev } else { max_score };

        let mut peaks: Vec<PeakForecastEntry> = active
            .iter()
            .filter(|e| e.demand_score >= threshold)
            .map(|e| (*e).clone())
            .collect();

        if peaks.is_empty() {
            if let Some(best) = active.iter().copied().min_by(|a, b| by_demand(a, b)) {
                peaks.push(best.clone());
            }
        }

        peaks.sort_by(by_demand);

        log::debug!(
            "🎯 Peak threshold {:.3} (mean {:.3}, stddev {:.3}) → {} of {} active hours",
            threshold,
            mean,
            stddev,
            peaks.len(),
            active.len()
        );
        peaks
    }
}

/// Highest demand first, then earliest hour
fn by_demand(a: &HourlyProfileEntry, b: &HourlyProfileEntry) -> Ordering {
    b.demand_score
        .total_cmp(&a.demand_score)
        .then_with(|| a.hour.cmp(&b.hour))
}
