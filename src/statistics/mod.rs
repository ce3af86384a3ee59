//! Per-region guidepost statistics, collected in the background and read by
//! the scan planner.
pub mod collector;

pub use collector::{CollectHandle, CollectOutcome, StatisticsCollector};

use chrono::Utc;

/// Milliseconds since the unix epoch.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
