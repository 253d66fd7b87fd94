//! Forecast Core - Hourly Demand Aggregation and Peak Detection
//!
//! Turns raw run/order history into an hourly demand picture and classifies
//! the busiest hours of the day as peaks.
//!
//! # Architecture
//!
//! ```text
//! SQLite store (foodrun, "order")
//!     ↓
//! fetch_hourly_timeseries   (calendar hour-blocks)
//! build_hourly_profile      (24 hour-of-day buckets, per-day averages)
//!     ↓
//! PeakDetector              (mean + stddev threshold, small-sample guard)
//!     ↓
//! PeakPayload → JSON / console summary / RewardIssuer
//! ```
//!
//! Aggregation and detection never write to the store. Sparse or empty history
//! produces zero-filled or empty results, not errors.

pub mod detector;
pub mod payload;
pub mod profile;
pub mod report;
pub mod timeseries;

pub use detector::PeakDetector;
pub use payload::{generate_peak_payload, PeakPayload};
pub use profile::{build_hourly_profile, HourlyProfileEntry, HourlyTotals, PeakForecastEntry};
pub use report::render_summary;
pub use timeseries::{fetch_hourly_timeseries, HourlyTimeseriesEntry};

/// Round to 3 decimal places so payloads compare and serialise stably
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// `numerator / denominator`, or 0.0 when there is nothing to divide by
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
