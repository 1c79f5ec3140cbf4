//! Time arithmetic shared by settings validation and tick evaluation
//!
//! All comparisons are done in whole milliseconds between UTC instants.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};

use crate::host::ProgramInfo;

/// EPG times are broadcast in JST
pub const EPG_UTC_OFFSET_HOURS: i64 = 9;

/// Signed difference `a - b` in milliseconds
pub fn diff_millis(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    a.signed_duration_since(b).num_milliseconds()
}

/// Converts an EPG-local start time to UTC, `None` if it is out of range
pub fn epg_to_utc(epg_time: NaiveDateTime) -> Option<DateTime<Utc>> {
    epg_time
        .checked_sub_signed(Duration::hours(EPG_UTC_OFFSET_HOURS))
        .map(|t| t.and_utc())
}

/// End instant of a program.
///
/// `None` when the EPG has no duration for it or the times are out of range.
pub fn program_end_utc(program: &ProgramInfo) -> Option<DateTime<Utc>> {
    if program.duration_seconds == 0 {
        return None;
    }
    epg_to_utc(program.start_time)?
        .checked_add_signed(Duration::seconds(i64::from(program.duration_seconds)))
}

/// Interprets a wall-clock value in `tz` and normalizes it to UTC.
///
/// Ambiguous times (clock turned back) resolve to the earlier instant;
/// times skipped by a forward transition yield `None`.
pub fn local_to_utc<Tz: TimeZone>(tz: &Tz, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(local) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Whole seconds from `now` until `deadline`, zero once it has passed
pub fn seconds_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> u64 {
    u64::try_from(diff_millis(deadline, now).max(0) / 1000).unwrap_or(0)
}
