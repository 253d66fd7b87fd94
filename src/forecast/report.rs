//! Human-readable console summary of a forecast payload

use super::payload::PeakPayload;
use super::profile::HourlyProfileEntry;
use std::fmt::Write;

const TOP_HOURS: usize = 5;

pub fn render_summary(payload: &PeakPayload) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Observed {} hourly buckets | runs={} orders={}",
        payload.hourly_timeseries.len(),
        payload.total_runs(),
        payload.total_orders()
    );

    let mut top: Vec<&HourlyProfileEntry> = payload.hourly_profile.iter().collect();
    top.sort_by(|a, b| b.demand_score.total_cmp(&a.demand_score));

    let _ = writeln!(out, "\nTop hours by demand score:");
    for entry in top.into_iter().take(TOP_HOURS) {
        let _ = writeln!(
            out,
            "  Hour {:02}: score={:.3} | avg_orders={:.2} | avg_runs={:.2}",
            entry.hour, entry.demand_score, entry.avg_orders_per_day, entry.avg_runs_per_day
        );
    }

    let _ = writeln!(out, "\nForecast peak windows (sorted):");
    if payload.peak_forecast.is_empty() {
        let _ = writeln!(out, "  none (not enough active hours)");
    }
    for entry in &payload.peak_forecast {
        let _ = writeln!(
            out,
            "  {} → demand_score={:.3} | utilization={:.2}",
            entry.window_label(),
            entry.demand_score,
            entry.utilization_ratio
        );
    }

    out
}
