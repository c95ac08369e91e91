// src/stats/aggregate.rs
//
// Day-bucketed PV/UV aggregation over a document's read log. Buckets use
// the local calendar of the log producer, keyed by fixed-width YYYY-MM-DD
// labels so lexicographic order is date order.

use crate::core::constants::{DAY_FORMAT, WAU_WINDOW_DAYS};
use crate::stats::event_log::{self, ReadEvent};
use chrono::{Local, NaiveDate, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Which projection of the history to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// One bucket per calendar day with any activity, ascending.
    AllHistory,
    /// Exactly `n` buckets for the `n` calendar days ending today, zero-filled,
    /// plus yesterday-DAU and trailing-7-day WAU.
    TrailingWindow(usize),
}

#[derive(Debug, Default, Clone)]
struct DayBucket {
    pv: u64,
    visitors: HashSet<String>,
}

/// Computed statistics for one document. Serialized field names match the
/// wire contract of the stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub days: Vec<String>,
    pub pv_series: Vec<u64>,
    pub uv_series: Vec<u64>,
    pub total_pv: u64,
    pub total_uv: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yesterday_dau: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wau: Option<u64>,
}

/// Aggregate the full on-disk history for a document. Missing or corrupt
/// logs come back as an all-zero result, never an error.
pub fn aggregate(data_dir: &Path, doc_id: &str, view: View) -> AggregateResult {
    let events = event_log::read_events(data_dir, doc_id);
    aggregate_events(&events, view, Local::now().date_naive())
}

/// Pure aggregation core; `today` is injected so the window logic is
/// testable without a clock.
pub fn aggregate_events(events: &[ReadEvent], view: View, today: NaiveDate) -> AggregateResult {
    let mut buckets: BTreeMap<String, DayBucket> = BTreeMap::new();
    let mut total_pv = 0u64;
    let mut all_visitors: HashSet<String> = HashSet::new();

    for event in events {
        if !event.is_valid() {
            continue;
        }
        let Some(day) = day_label(event.last_ts) else {
            continue;
        };

        let subject = event.subject_id().to_string();
        let bucket = buckets.entry(day).or_default();
        bucket.pv += 1;
        bucket.visitors.insert(subject.clone());

        total_pv += 1;
        all_visitors.insert(subject);
    }

    let mut result = AggregateResult {
        days: Vec::new(),
        pv_series: Vec::new(),
        uv_series: Vec::new(),
        total_pv,
        total_uv: all_visitors.len() as u64,
        yesterday_dau: None,
        wau: None,
    };

    match view {
        View::AllHistory => {
            // BTreeMap iteration gives the ascending day order for free.
            for (day, bucket) in &buckets {
                result.days.push(day.clone());
                result.pv_series.push(bucket.pv);
                result.uv_series.push(bucket.visitors.len() as u64);
            }
        }
        View::TrailingWindow(n) => {
            for offset in (0..n as i64).rev() {
                let label = (today - TimeDelta::days(offset)).format(DAY_FORMAT).to_string();
                let (pv, uv) = buckets
                    .get(&label)
                    .map(|b| (b.pv, b.visitors.len() as u64))
                    .unwrap_or((0, 0));
                result.days.push(label);
                result.pv_series.push(pv);
                result.uv_series.push(uv);
            }

            let yesterday = (today - TimeDelta::days(1)).format(DAY_FORMAT).to_string();
            result.yesterday_dau = Some(
                buckets
                    .get(&yesterday)
                    .map(|b| b.visitors.len() as u64)
                    .unwrap_or(0),
            );

            let mut weekly: HashSet<&String> = HashSet::new();
            for offset in 0..WAU_WINDOW_DAYS as i64 {
                let label = (today - TimeDelta::days(offset)).format(DAY_FORMAT).to_string();
                if let Some(bucket) = buckets.get(&label) {
                    weekly.extend(bucket.visitors.iter());
                }
            }
            result.wau = Some(weekly.len() as u64);
        }
    }

    result
}

/// Local calendar-day label for an epoch-milliseconds timestamp.
fn day_label(ts_millis: f64) -> Option<String> {
    Local
        .timestamp_millis_opt(ts_millis as i64)
        .single()
        .map(|dt| dt.format(DAY_FORMAT).to_string())
}
