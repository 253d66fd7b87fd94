//! Store records read and written by the reward issuer

use crate::timestamp::{parse_timestamp, TimestampValue};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Format used when this crate writes timestamps
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A delivery trip, as far as reward issuance cares
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub id: i64,
    pub runner_id: i64,
    pub capacity: i64,
    pub status: String,
    pub created_at: TimestampValue,
}

impl Run {
    pub const COLUMNS: &'static str = "id, runner_id, capacity, status, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            runner_id: row.get(1)?,
            capacity: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            status: row.get(3)?,
            created_at: TimestampValue::from_sql(row.get_ref(4)?),
        })
    }

    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }
}

/// Point grant for completing a run during a peak hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerReward {
    pub id: i64,
    pub runner_id: i64,
    pub run_id: i64,
    pub points: i64,
    pub reason: String,
    #[serde(with = "store_timestamp")]
    pub awarded_at: NaiveDateTime,
}

impl RunnerReward {
    pub const COLUMNS: &'static str = "id, runner_id, run_id, points, reason, awarded_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let awarded_raw = TimestampValue::from_sql(row.get_ref(5)?);
        let awarded_at = parse_timestamp(&awarded_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unparsable awarded_at: {:?}", awarded_raw).into(),
            )
        })?;

        Ok(Self {
            id: row.get(0)?,
            runner_id: row.get(1)?,
            run_id: row.get(2)?,
            points: row.get(3)?,
            reason: row.get(4)?,
            awarded_at,
        })
    }
}

mod store_timestamp {
    use super::STORE_TIMESTAMP_FORMAT;
    use crate::timestamp::{parse_timestamp, TimestampValue};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(STORE_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        parse_timestamp(&TimestampValue::Text(text.clone()))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_run_from_row_keeps_raw_timestamp() {
        let conn = Connection::open_in_memory().unwrap();
        let run = conn
            .query_row(
                "SELECT 3, 9, NULL, 'completed', 'not a date'",
                [],
                Run::from_row,
            )
            .unwrap();

        assert_eq!(run.capacity, 0);
        assert_eq!(run.created_at, TimestampValue::Text("not a date".to_string()));
        assert_eq!(run.created_at(), None);
    }

    #[test]
    fn test_reward_json_shape() {
        let conn = Connection::open_in_memory().unwrap();
        let reward = conn
            .query_row(
                "SELECT 1, 2, 3, 5, 'Peak hour bonus (2025-01-01 17:00)', '2025-01-01 18:30:00.000000'",
                [],
                RunnerReward::from_row,
            )
            .unwrap();

        let json = serde_json::to_value(&reward).unwrap();
        assert_eq!(json["run_id"], 3);
        assert_eq!(json["awarded_at"], "2025-01-01 18:30:00.000000");

        let back: RunnerReward = serde_json::from_value(json).unwrap();
        assert_eq!(back, reward);
    }
}
