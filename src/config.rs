//! Forecast and reward configuration
//!
//! Every tunable the detector and issuer use lives here and is passed in
//! explicitly. `AppConfig::from_env` fills the structures from environment
//! variables, falling back to defaults for anything unset or unparsable.

use std::env;
use std::str::FromStr;

/// Weights combining per-hour averages into a demand score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandWeights {
    pub orders: f64,
    pub runs: f64,
    pub utilization: f64,
}

impl Default for DemandWeights {
    fn default() -> Self {
        Self {
            orders: 0.6,
            runs: 0.3,
            utilization: 0.1,
        }
    }
}

impl DemandWeights {
    pub fn score(&self, avg_orders: f64, avg_runs: f64, utilization: f64) -> f64 {
        avg_orders * self.orders + avg_runs * self.runs + utilization * self.utilization
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Fewer active hours than this yields no forecast at all
    pub min_active_hours: usize,
    pub weights: DemandWeights,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_active_hours: 3,
            weights: DemandWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewardConfig {
    pub points_per_run: i64,
    pub lookback_hours: i64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            points_per_run: 5,
            lookback_hours: 24,
        }
    }
}

/// Runtime configuration for the forecast binary
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub forecast: ForecastConfig,
    pub rewards: RewardConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `RUNPEAK_DB_PATH` (default: backend/dev.db)
    /// - `PEAK_MIN_ACTIVE_HOURS` (default: 3)
    /// - `PEAK_WEIGHT_ORDERS` / `PEAK_WEIGHT_RUNS` / `PEAK_WEIGHT_UTILIZATION`
    ///   (default: 0.6 / 0.3 / 0.1)
    /// - `PEAK_POINTS_PER_RUN` (default: 5)
    /// - `PEAK_LOOKBACK_HOURS` (default: 24)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let forecast_defaults = ForecastConfig::default();
        let weight_defaults = forecast_defaults.weights;
        let reward_defaults = RewardConfig::default();

        Self {
            db_path: lookup("RUNPEAK_DB_PATH").unwrap_or_else(|| "backend/dev.db".to_string()),

            forecast: ForecastConfig {
                min_active_hours: parsed(&lookup, "PEAK_MIN_ACTIVE_HOURS")
                    .unwrap_or(forecast_defaults.min_active_hours),
                weights: DemandWeights {
                    orders: parsed(&lookup, "PEAK_WEIGHT_ORDERS").unwrap_or(weight_defaults.orders),
                    runs: parsed(&lookup, "PEAK_WEIGHT_RUNS").unwrap_or(weight_defaults.runs),
                    utilization: parsed(&lookup, "PEAK_WEIGHT_UTILIZATION")
                        .unwrap_or(weight_defaults.utilization),
                },
            },

            rewards: RewardConfig {
                points_per_run: parsed(&lookup, "PEAK_POINTS_PER_RUN")
                    .unwrap_or(reward_defaults.points_per_run),
                lookback_hours: parsed(&lookup, "PEAK_LOOKBACK_HOURS")
                    .unwrap_or(reward_defaults.lookback_hours),
            },
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::from_lookup(|_| None);

        assert_eq!(config.db_path, "backend/dev.db");
        assert_eq!(config.forecast.min_active_hours, 3);
        assert_eq!(config.forecast.weights, DemandWeights::default());
        assert_eq!(config.rewards.points_per_run, 5);
        assert_eq!(config.rewards.lookback_hours, 24);
    }

    #[test]
    fn test_custom_config() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("RUNPEAK_DB_PATH", "/tmp/runs.db"),
            ("PEAK_MIN_ACTIVE_HOURS", "5"),
            ("PEAK_WEIGHT_ORDERS", "1.0"),
            ("PEAK_POINTS_PER_RUN", "10"),
            ("PEAK_LOOKBACK_HOURS", " 48 "),
        ]));

        assert_eq!(config.db_path, "/tmp/runs.db");
        assert_eq!(config.forecast.min_active_hours, 5);
        assert_eq!(config.forecast.weights.orders, 1.0);
        assert_eq!(config.forecast.weights.runs, 0.3);
        assert_eq!(config.rewards.points_per_run, 10);
        assert_eq!(config.rewards.lookback_hours, 48);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PEAK_MIN_ACTIVE_HOURS", "three"),
            ("PEAK_POINTS_PER_RUN", ""),
        ]));

        assert_eq!(config.forecast.min_active_hours, 3);
        assert_eq!(config.rewards.points_per_run, 5);
    }

    #[test]
    fn test_weighted_score() {
        let weights = DemandWeights::default();
        let score = weights.score(5.0, 1.0, 1.0);
        assert!((score - 3.4).abs() < 1e-9);
    }
}
