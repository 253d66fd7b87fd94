//! Idempotent reward issuer
//!
//! All inserts and point credits of one call share a single IMMEDIATE
//! transaction, so concurrent issuers queue on the SQLite write lock. Each
//! insert is additionally guarded by `NOT EXISTS (run_id)`, and the runner is
//! credited only when that insert actually wrote a row.

use crate::config::RewardConfig;
use crate::error::Result;
use crate::forecast::PeakForecastEntry;
use crate::store::models::STORE_TIMESTAMP_FORMAT;
use crate::store::{Run, RunnerReward, REWARDS_TABLE, RUNS_TABLE, USERS_TABLE};
use chrono::{Duration, NaiveDateTime, Timelike, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::BTreeSet;

pub struct RewardIssuer {
    config: RewardConfig,
}

impl RewardIssuer {
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RewardConfig::default())
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Issue rewards for peak-hour runs completed in the last `lookback_hours`
    pub fn issue_peak_rewards(
        &self,
        conn: &mut Connection,
        peak_hours: &[PeakForecastEntry],
    ) -> Result<Vec<RunnerReward>> {
        self.issue_peak_rewards_at(conn, peak_hours, Utc::now().naive_utc())
    }

    /// Same as `issue_peak_rewards` with an explicit "now" (UTC)
    ///
    /// Returns only the rewards created by this call. Runs whose `created_at`
    /// cannot be parsed are skipped, never fatal.
    pub fn issue_peak_rewards_at(
        &self,
        conn: &mut Connection,
        peak_hours: &[PeakForecastEntry],
        now: NaiveDateTime,
    ) -> Result<Vec<RunnerReward>> {
        let target_hours: BTreeSet<u32> = peak_hours
            .iter()
            .map(|entry| entry.hour)
            .filter(|hour| *hour < 24)
            .collect();
        if target_hours.is_empty() {
            log::debug!("🎁 No peak hours supplied, nothing to reward");
            return Ok(Vec::new());
        }

        let points = self.config.points_per_run;
        let cutoff = lookback_cutoff(now, self.config.lookback_hours);
        let awarded_at = now.format(STORE_TIMESTAMP_FORMAT).to_string();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let runs: Vec<Run> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM {} WHERE status = 'completed' ORDER BY id",
                Run::COLUMNS,
                RUNS_TABLE
            ))?;
            let rows = stmt.query_map([], Run::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let insert_sql = format!(
            "INSERT INTO {table} (runner_id, run_id, points, reason, awarded_at)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE run_id = ?2)",
            table = REWARDS_TABLE
        );
        let credit_sql = format!(
            "UPDATE {} SET points = COALESCE(points, 0) + ?1 WHERE id = ?2",
            USERS_TABLE
        );

        let mut issued_ids = Vec::new();
        let mut unparsable = 0usize;
        let mut already_rewarded = 0usize;

        for run in &runs {
            let Some(created_at) = run.created_at() else {
                unparsable += 1;
                continue;
            };
            if created_at < cutoff || !target_hours.contains(&created_at.hour()) {
                continue;
            }

            let reason = format!("Peak hour bonus ({})", created_at.format("%Y-%m-%d %H:00"));
            let inserted = tx.execute(
                &insert_sql,
                params![run.runner_id, run.id, points, reason, awarded_at],
            )?;
            if inserted == 0 {
                already_rewarded += 1;
                continue;
            }
            issued_ids.push(tx.last_insert_rowid());

            let credited = tx.execute(&credit_sql, params![points, run.runner_id])?;
            if credited == 0 {
                log::warn!(
                    "⚠️  Runner {} for run {} not found, reward stored without credit",
                    run.runner_id,
                    run.id
                );
            }
        }

        tx.commit()?;

        if unparsable > 0 {
            log::warn!("⚠️  Skipped {} completed runs with unreadable created_at", unparsable);
        }
        log::info!(
            "🎁 Issued {} peak rewards ({} already rewarded, peak hours {:?})",
            issued_ids.len(),
            already_rewarded,
            target_hours
        );

        issued_ids
            .into_iter()
            .map(|id| fetch_reward(conn, id))
            .collect()
    }
}

/// Earliest `created_at` still eligible; a lookback past chrono's range covers all history
fn lookback_cutoff(now: NaiveDateTime, lookback_hours: i64) -> NaiveDateTime {
    Duration::try_hours(lookback_hours)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Most recently awarded rewards first
pub fn list_recent_rewards(conn: &Connection, limit: usize) -> Result<Vec<RunnerReward>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY awarded_at DESC, id DESC LIMIT ?1",
        RunnerReward::COLUMNS,
        REWARDS_TABLE
    ))?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map([limit], RunnerReward::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn fetch_reward(conn: &Connection, id: i64) -> Result<RunnerReward> {
    let reward = conn.query_row(
        &format!(
            "SELECT {} FROM {} WHERE id = ?1",
            RunnerReward::COLUMNS,
            REWARDS_TABLE
        ),
        [id],
        RunnerReward::from_row,
    )?;
    Ok(reward)
}
