//! runpeak - peak-demand forecasting and reward issuance for campus food runs
//!
//! ```text
//! store (foodrun, "order") → forecast::{timeseries, profile} → forecast::PeakDetector
//!                                                                   ↓
//!                                         rewards::RewardIssuer → runnerreward, user.points
//! ```
//!
//! Every operation takes an explicit `rusqlite::Connection`; nothing here holds
//! global connection state.

pub mod config;
pub mod error;
pub mod forecast;
pub mod rewards;
pub mod store;
pub mod timestamp;

pub use config::{AppConfig, DemandWeights, ForecastConfig, RewardConfig};
pub use error::{Result, RunpeakError};
pub use forecast::{
    build_hourly_profile, fetch_hourly_timeseries, generate_peak_payload, render_summary,
    HourlyProfileEntry, HourlyTimeseriesEntry, PeakDetector, PeakForecastEntry, PeakPayload,
};
pub use rewards::{list_recent_rewards, RewardIssuer};
pub use store::{open_store, RunnerReward};
pub use timestamp::{parse_timestamp, TimestampValue};
