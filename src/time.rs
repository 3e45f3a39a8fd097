//! Timestamp helpers shared across the pipeline.
//!
//! All components exchange timestamps as `f64` seconds since the Unix
//! epoch, matching the second-granularity arithmetic used throughout
//! SPEC_FULL.md (window spans, cooldowns, TTLs). `chrono` is reserved for
//! the places that genuinely need calendar semantics: the tilt tracker's
//! day-rollover check and the ledger's date-partitioned directories.

use chrono::{DateTime, NaiveDate, Utc};

pub type Timestamp = f64;

/// Calendar date (UTC) a timestamp falls on, for day-rollover and
/// directory-naming purposes.
pub fn calendar_date(ts: Timestamp) -> NaiveDate {
    let secs = ts.floor() as i64;
    let nanos = ((ts - secs as f64) * 1e9).round() as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos.min(999_999_999))
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        .date_naive()
}

/// `now` expressed as `Timestamp`, for binaries/tests that want wall time.
/// The core itself never calls this on the decision path; timestamps flow
/// in from the collector snapshot per tick.
pub fn wall_clock_now() -> Timestamp {
    Utc::now().timestamp() as f64 + (Utc::now().timestamp_subsec_nanos() as f64) / 1e9
}
