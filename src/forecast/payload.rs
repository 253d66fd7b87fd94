//! Combined forecast payload handed to the CLI and API boundary

use super::detector::PeakDetector;
use super::profile::{build_hourly_profile, HourlyProfileEntry, PeakForecastEntry};
use super::timeseries::{fetch_hourly_timeseries, HourlyTimeseriesEntry};
use crate::config::ForecastConfig;
use crate::error::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakPayload {
    pub hourly_timeseries: Vec<HourlyTimeseriesEntry>,
    pub hourly_profile: Vec<HourlyProfileEntry>,
    pub peak_forecast: Vec<PeakForecastEntry>,
}

impl PeakPayload {
    pub fn total_runs(&self) -> i64 {
        self.hourly_timeseries.iter().map(|e| e.run_count).sum()
    }

    pub fn total_orders(&self) -> i64 {
        self.hourly_timeseries.iter().map(|e| e.order_count).sum()
    }

    /// Write pretty JSON, creating parent directories as needed
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("💾 Wrote forecast payload: {}", path.display());
        Ok(())
    }
}

/// Aggregate the store and run peak detection in one pass
pub fn generate_peak_payload(conn: &Connection, config: &ForecastConfig) -> Result<PeakPayload> {
    let hourly_timeseries = fetch_hourly_timeseries(conn)?;
    let hourly_profile = build_hourly_profile(conn, &config.weights)?;
    let peak_forecast = PeakDetector::from_config(config).forecast_peak_hours(&hourly_profile);

    log::info!(
        "📈 Forecast ready: {} hourly buckets, {} peak hours",
        hourly_timeseries.len(),
        peak_forecast.len()
    );

    Ok(PeakPayload {
        hourly_timeseries,
        hourly_profile,
        peak_forecast,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::apply_schema;
    use tempfile::tempdir;

    #[test]
    fn test_empty_store_payload() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let payload = generate_peak_payload(&conn, &ForecastConfig::default()).unwrap();
        assert!(payload.hourly_timeseries.is_empty());
        assert_eq!(payload.hourly_profile.len(), 24);
        assert!(payload.peak_forecast.is_empty());
        assert_eq!(payload.total_runs(), 0);
    }

    #[test]
    fn test_json_keys_and_file_output() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        let payload = generate_peak_payload(&conn, &ForecastConfig::default()).unwrap();

        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/reports/forecast.json");
        payload.write_json(&out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"hourly_timeseries"));
        assert!(keys.contains(&"hourly_profile"));
        assert!(keys.contains(&"peak_forecast"));

        let back: PeakPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back, payload);
    }
}
