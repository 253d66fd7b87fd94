//! Calendar hour-block time series of runs and orders

use super::{ratio, round3};
use crate::error::Result;
use crate::store::{CREATED_AT_EXPR, ORDERS_TABLE, RUNS_TABLE};
use crate::timestamp::{parse_timestamp, TimestampValue};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTimeseriesEntry {
    #[serde(with = "hour_block_format")]
    pub hour_block: NaiveDateTime,
    pub run_count: i64,
    pub completed_runs: i64,
    pub total_capacity: i64,
    pub order_count: i64,
    pub utilization: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct RunBucket {
    run_count: i64,
    total_capacity: i64,
    completed_runs: i64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    runs: RunBucket,
    order_count: i64,
}

/// Group runs and orders by calendar hour and merge them, ascending by hour
///
/// An hour-block seen on only one side still gets an entry with the other
/// side zeroed. Rows whose `created_at` SQLite cannot interpret have no
/// hour-block and are left out (logged at warn).
pub fn fetch_hourly_timeseries(conn: &Connection) -> Result<Vec<HourlyTimeseriesEntry>> {
    let mut buckets: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();
    let mut unplaced_runs = 0i64;
    let mut unplaced_orders = 0i64;

    let run_sql = format!(
        "SELECT strftime('%Y-%m-%d %H:00:00', {expr}) AS hour_block,
                COUNT(*) AS run_count,
                CAST(COALESCE(SUM(capacity), 0) AS INTEGER) AS total_capacity,
                SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS completed_runs
         FROM {table}
         GROUP BY hour_block
         ORDER BY hour_block",
        expr = CREATED_AT_EXPR,
        table = RUNS_TABLE,
    );
    let mut stmt = conn.prepare(&run_sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            RunBucket {
                run_count: row.get(1)?,
                total_capacity: row.get(2)?,
                completed_runs: row.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (block, runs) = row?;
        match block.as_deref().and_then(hour_block_from_sql) {
            Some(hour_block) => buckets.entry(hour_block).or_default().runs = runs,
            None => unplaced_runs += runs.run_count,
        }
    }

    let order_sql = format!(
        "SELECT strftime('%Y-%m-%d %H:00:00', {expr}) AS hour_block,
                COUNT(*) AS order_count
         FROM {table}
         GROUP BY hour_block
         ORDER BY hour_block",
        expr = CREATED_AT_EXPR,
        table = ORDERS_TABLE,
    );
    let mut stmt = conn.prepare(&order_sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (block, order_count) = row?;
        match block.as_deref().and_then(hour_block_from_sql) {
            Some(hour_block) => buckets.entry(hour_block).or_default().order_count = order_count,
            None => unplaced_orders += order_count,
        }
    }

    if unplaced_runs > 0 || unplaced_orders > 0 {
        log::warn!(
            "⚠️  Skipped {} runs and {} orders with unreadable created_at",
            unplaced_runs,
            unplaced_orders
        );
    }

    let series: Vec<HourlyTimeseriesEntry> = buckets
        .into_iter()
        .map(|(hour_block, bucket)| HourlyTimeseriesEntry {
            hour_block,
            run_count: bucket.runs.run_count,
            completed_runs: bucket.runs.completed_runs,
            total_capacity: bucket.runs.total_capacity,
            order_count: bucket.order_count,
            utilization: round3(ratio(
                bucket.order_count as f64,
                bucket.runs.total_capacity as f64,
            )),
        })
        .collect();

    log::debug!("📊 Built {} hourly buckets", series.len());
    Ok(series)
}

fn hour_block_from_sql(text: &str) -> Option<NaiveDateTime> {
    parse_timestamp(&TimestampValue::Text(text.to_string()))
}

mod hour_block_format {
    use crate::timestamp::{parse_timestamp, TimestampValue};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:00:00";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        parse_timestamp(&TimestampValue::Text(text.clone()))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hour_block: {}", text)))
    }
}
