//! 24-bucket hour-of-day demand profile

use super::{ratio, round3};
use crate::config::DemandWeights;
use crate::error::Result;
use crate::store::{CREATED_AT_EXPR, ORDERS_TABLE, RUNS_TABLE};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: usize = 24;

/// Average demand for one hour of the day across all observed days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfileEntry {
    pub hour: u32,
    pub avg_orders_per_day: f64,
    pub avg_runs_per_day: f64,
    pub avg_capacity_per_day: f64,
    pub utilization_ratio: f64,
    pub demand_score: f64,
}

/// Profile entry classified as a peak; same shape as the profile entry
pub type PeakForecastEntry = HourlyProfileEntry;

impl HourlyProfileEntry {
    /// Hour had any orders or runs at all
    pub fn is_active(&self) -> bool {
        self.avg_orders_per_day > 0.0 || self.avg_runs_per_day > 0.0
    }

    /// Display window, e.g. `17:00 - 18:00`
    pub fn window_label(&self) -> String {
        format!("{:02}:00 - {:02}:00", self.hour, (self.hour + 1) % 24)
    }
}

/// Raw per-hour sums plus the day counts used to average them
///
/// Orders and runs are averaged over their own day counts so a table with
/// sparser history does not drag the other one down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyTotals {
    pub orders: [i64; HOURS_PER_DAY],
    pub runs: [i64; HOURS_PER_DAY],
    pub capacity: [i64; HOURS_PER_DAY],
    pub order_days: i64,
    pub run_days: i64,
}

impl HourlyTotals {
    /// Read hour-of-day sums and distinct-day counts from the store
    pub fn fetch(conn: &Connection) -> Result<Self> {
        let mut totals = Self::default();

        let order_sql = format!(
            "SELECT CAST(strftime('%H', {expr}) AS INTEGER) AS hour_of_day,
                    COUNT(*) AS order_count
             FROM {table}
             GROUP BY hour_of_day",
            expr = CREATED_AT_EXPR,
            table = ORDERS_TABLE,
        );
        let mut stmt = conn.prepare(&order_sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            if let (Some(hour), count) = row? {
                if let Some(slot) = hour_slot(hour) {
                    totals.orders[slot] = count;
                }
            }
        }

        let run_sql = format!(
            "SELECT CAST(strftime('%H', {expr}) AS INTEGER) AS hour_of_day,
                    COUNT(*) AS run_count,
                    CAST(COALESCE(SUM(capacity), 0) AS INTEGER) AS capacity_sum
             FROM {table}
             GROUP BY hour_of_day",
            expr = CREATED_AT_EXPR,
            table = RUNS_TABLE,
        );
        let mut stmt = conn.prepare(&run_sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in rows {
            if let (Some(hour), count, capacity) = row? {
                if let Some(slot) = hour_slot(hour) {
                    totals.runs[slot] = count;
                    totals.capacity[slot] = capacity;
                }
            }
        }

        totals.order_days = distinct_day_count(conn, ORDERS_TABLE)?;
        totals.run_days = distinct_day_count(conn, RUNS_TABLE)?;

        log::debug!(
            "📥 Hourly totals: {} order days, {} run days",
            totals.order_days,
            totals.run_days
        );
        Ok(totals)
    }

    /// Average the sums into exactly 24 profile entries, hour 0 first
    pub fn to_profile(&self, weights: &DemandWeights) -> Vec<HourlyProfileEntry> {
        let order_days = self.order_days as f64;
        let run_days = self.run_days as f64;

        (0..HOURS_PER_DAY)
            .map(|slot| {
                let total_orders = self.orders[slot] as f64;
                let total_runs = self.runs[slot] as f64;
                let total_capacity = self.capacity[slot] as f64;

                let avg_orders = ratio(total_orders, order_days);
                let avg_runs = ratio(total_runs, run_days);
                let avg_capacity = ratio(total_capacity, run_days);
                let utilization = ratio(total_orders, total_capacity);

                HourlyProfileEntry {
                    hour: slot as u32,
                    avg_orders_per_day: round3(avg_orders),
                    avg_runs_per_day: round3(avg_runs),
                    avg_capacity_per_day: round3(avg_capacity),
                    utilization_ratio: round3(utilization),
                    demand_score: round3(weights.score(avg_orders, avg_runs, utilization)),
                }
            })
            .collect()
    }
}

/// Build the hour-of-day demand profile from the store
pub fn build_hourly_profile(
    conn: &Connection,
    weights: &DemandWeights,
) -> Result<Vec<HourlyProfileEntry>> {
    Ok(HourlyTotals::fetch(conn)?.to_profile(weights))
}

fn hour_slot(hour: i64) -> Option<usize> {
    usize::try_from(hour).ok().filter(|h| *h < HOURS_PER_DAY)
}

fn distinct_day_count(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(DISTINCT date({expr})) FROM {table}",
        expr = CREATED_AT_EXPR,
        table = table,
    );
    let count: Option<i64> = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::apply_schema;
    use rusqlite::params;
    use std::collections::HashSet;

    fn setup_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn.execute("INSERT INTO user (id, username) VALUES (1, 'runner')", [])
            .unwrap();
        conn
    }

    fn insert_run(conn: &Connection, created_at: &str, capacity: i64) -> i64 {
        conn.execute(
            "INSERT INTO foodrun (runner_id, restaurant, drop_point, capacity, status, created_at)
             VALUES (1, 'Chick-fil-A', 'Quad', ?1, 'completed', ?2)",
            params![capacity, created_at],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    fn insert_order(conn: &Connection, run_id: i64, created_at: &str) {
        conn.execute(
            "INSERT INTO \"order\" (run_id, user_id, created_at) VALUES (?1, 1, ?2)",
            params![run_id, created_at],
        )
        .unwrap();
    }

    #[test]
    fn test_empty_store_yields_24_zero_entries() {
        let conn = setup_store();
        let profile = build_hourly_profile(&conn, &DemandWeights::default()).unwrap();

        assert_eq!(profile.len(), 24);
        let hours: HashSet<u32> = profile.iter().map(|e| e.hour).collect();
        assert_eq!(hours, (0..24).collect());
        assert!(profile.iter().all(|e| !e.is_active() && e.demand_score == 0.0));
    }

    #[test]
    fn test_single_hour_scenario() {
        let conn = setup_store();
        for day in 1..=10 {
            let run = insert_run(&conn, &format!("2025-02-{:02} 17:10:00", day), 5);
            for minute in 0..5 {
                insert_order(&conn, run, &format!("2025-02-{:02} 17:{:02}:00", day, 20 + minute));
            }
        }

        let profile = build_hourly_profile(&conn, &DemandWeights::default()).unwrap();
        let hour17 = &profile[17];

        assert_eq!(hour17.hour, 17);
        assert_eq!(hour17.avg_runs_per_day, 1.0);
        assert_eq!(hour17.avg_orders_per_day, 5.0);
        assert_eq!(hour17.avg_capacity_per_day, 5.0);
        assert_eq!(hour17.utilization_ratio, 1.0);
        assert_eq!(hour17.demand_score, 3.4);
        assert_eq!(profile.iter().filter(|e| e.is_active()).count(), 1);
    }

    #[test]
    fn test_separate_day_denominators() {
        let conn = setup_store();
        // Orders on 4 days, runs on only 1 of them
        let run = insert_run(&conn, "2025-02-01 12:00:00", 10);
        for day in 1..=4 {
            insert_order(&conn, run, &format!("2025-02-{:02} 12:30:00", day));
            insert_order(&conn, run, &format!("2025-02-{:02} 12:45:00", day));
        }

        let totals = HourlyTotals::fetch(&conn).unwrap();
        assert_eq!(totals.order_days, 4);
        assert_eq!(totals.run_days, 1);

        let noon = &totals.to_profile(&DemandWeights::default())[12];
        assert_eq!(noon.avg_orders_per_day, 2.0);
        assert_eq!(noon.avg_runs_per_day, 1.0);
        assert_eq!(noon.avg_capacity_per_day, 10.0);
        assert_eq!(noon.utilization_ratio, 0.8);
    }

    #[test]
    fn test_rounding_to_three_places() {
        let mut totals = HourlyTotals::default();
        totals.orders[9] = 1;
        totals.runs[9] = 2;
        totals.capacity[9] = 3;
        totals.order_days = 3;
        totals.run_days = 3;

        let entry = &totals.to_profile(&DemandWeights::default())[9];
        assert_eq!(entry.avg_orders_per_day, 0.333);
        assert_eq!(entry.avg_runs_per_day, 0.667);
        assert_eq!(entry.utilization_ratio, 0.333);
        // 0.6/3 + 0.3*2/3 + 0.1/3 = 0.4333..
        assert_eq!(entry.demand_score, 0.433);
    }

    #[test]
    fn test_zero_capacity_and_custom_weights() {
        let mut totals = HourlyTotals::default();
        totals.orders[20] = 6;
        totals.order_days = 2;

        let weights = DemandWeights {
            orders: 1.0,
            runs: 0.0,
            utilization: 0.0,
        };
        let entry = &totals.to_profile(&weights)[20];
        assert_eq!(entry.avg_runs_per_day, 0.0);
        assert_eq!(entry.avg_capacity_per_day, 0.0);
        assert_eq!(entry.utilization_ratio, 0.0);
        assert_eq!(entry.demand_score, 3.0);
    }

    #[test]
    fn test_all_fields_non_negative() {
        let conn = setup_store();
        for (i, hour) in [0, 3, 7, 7, 13, 23].iter().enumerate() {
            let run = insert_run(&conn, &format!("2025-02-0{} {:02}:00:00", 1 + i % 3, hour), i as i64);
            insert_order(&conn, run, &format!("2025-02-0{} {:02}:30:00", 1 + i % 2, hour));
        }

        for entry in build_hourly_profile(&conn, &DemandWeights::default()).unwrap() {
            assert!(entry.avg_orders_per_day >= 0.0);
            assert!(entry.avg_runs_per_day >= 0.0);
            assert!(entry.avg_capacity_per_day >= 0.0);
            assert!(entry.utilization_ratio >= 0.0);
            assert!(entry.demand_score >= 0.0);
        }
    }

    #[test]
    fn test_window_label_wraps_midnight() {
        let mut entry = HourlyTotals::default().to_profile(&DemandWeights::default())[23].clone();
        assert_eq!(entry.window_label(), "23:00 - 00:00");
        entry.hour = 8;
        assert_eq!(entry.window_label(), "08:00 - 09:00");
    }
}
