//! Daily nearest-neighbor resampling.
//!
//! Upstream publishes readings at irregular instants. We convert them to one row
//! per day by copying, for each target instant, the raw record closest in time.
//! There is no interpolation.
//!
//! Time axis:
//! - start: the first UTC midnight at or after the earliest record, moved forward
//!   to the latest record's time-of-day
//! - stop: the latest record's timestamp
//! - step: one day
//!
//! so the last row always lands exactly on the latest reading.

use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::debug;

use crate::domain::{DailyRow, RawRecord};

/// Sort records ascending by timestamp and drop repeated timestamps.
///
/// The first record seen for a timestamp wins. Returns the number of dropped
/// duplicates.
pub fn sort_and_dedup(records: &mut Vec<RawRecord>) -> usize {
    // Stable sort keeps publication order among equal timestamps.
    records.sort_by_key(|r| r.timestamp);
    let before = records.len();
    records.dedup_by_key(|r| r.timestamp);
    before - records.len()
}

/// First target instant of the daily axis, or `None` if it cannot be represented.
pub fn start_instant(earliest: DateTime<Utc>, latest: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let midnight = earliest.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    let boundary = if midnight == earliest {
        midnight
    } else {
        midnight.checked_add_signed(Duration::days(1))?
    };

    let time_of_day = Duration::seconds(i64::from(latest.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(latest.nanosecond() % 1_000_000_000));
    boundary.checked_add_signed(time_of_day)
}

/// Index of the record nearest to `target`, scanning forward from `from`.
///
/// `records` must be sorted ascending; repeated timestamps are tolerated.
/// Ties resolve to the earlier record.
pub fn nearest_index(records: &[RawRecord], target: DateTime<Utc>, from: usize) -> Option<usize> {
    if from >= records.len() {
        return None;
    }
    let distance = |r: &RawRecord| (r.timestamp - target).abs();

    let mut best = from;
    for (idx, record) in records.iter().enumerate().skip(from + 1) {
        if distance(record) < distance(&records[best]) {
            best = idx;
        }
        // Everything past the target only gets farther away.
        if record.timestamp >= target {
            break;
        }
    }
    Some(best)
}

/// Resample sorted raw records onto a daily axis.
///
/// Fewer than two records, or an axis whose start falls after the latest
/// record, yield an empty table.
pub fn resample_daily(records: &[RawRecord]) -> Vec<DailyRow> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Vec::new();
    };
    if records.len() < 2 {
        return Vec::new();
    }

    let stop = last.timestamp;
    let Some(start) = start_instant(first.timestamp, stop) else {
        return Vec::new();
    };
    if start > stop {
        debug!(%start, %stop, "resampling window is empty");
        return Vec::new();
    }

    let step = Duration::days(1);
    let n_rows = ((stop - start).num_seconds() / step.num_seconds()) as usize + 1;
    let mut rows = Vec::with_capacity(n_rows);

    // Targets increase monotonically, so the nearest index never moves backwards.
    let mut cursor = 0usize;
    let mut target = start;
    while target <= stop {
        let Some(idx) = nearest_index(records, target, cursor) else {
            break;
        };
        cursor = idx;
        rows.push(DailyRow {
            timestamp: target,
            counts: records[idx].counts,
        });
        target += step;
    }

    debug!(raw = records.len(), daily = rows.len(), %start, %stop, "resampled");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::Counts;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 11, day, hour, minute, 0).unwrap()
    }

    fn rec(t: DateTime<Utc>, cases: f64) -> RawRecord {
        RawRecord {
            timestamp: t,
            counts: Counts {
                cumulative_cases: cases,
                ..Counts::default()
            },
        }
    }

    #[test]
    fn degenerate_inputs_yield_empty_table() {
        assert!(resample_daily(&[]).is_empty());
        assert!(resample_daily(&[rec(at(1, 8, 0), 1.0)]).is_empty());

        // Both readings on the same afternoon: the first full day starts after the
        // latest reading.
        let same_day = [rec(at(1, 12, 0), 1.0), rec(at(1, 18, 0), 2.0)];
        assert!(resample_daily(&same_day).is_empty());
    }

    #[test]
    fn axis_is_daily_and_ends_on_latest_reading() {
        let records = vec![
            rec(at(1, 7, 15), 10.0),
            rec(at(2, 23, 5), 20.0),
            rec(at(4, 3, 40), 30.0),
            rec(at(4, 9, 0), 35.0),
            rec(at(7, 16, 45), 60.0),
        ];
        let rows = resample_daily(&records);

        // Start is Nov 2 16:45, stop Nov 7 16:45.
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].timestamp, at(2, 16, 45));
        for pair in rows.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::days(1));
        }
        let last = rows.last().unwrap();
        assert_eq!(last.timestamp, records.last().unwrap().timestamp);
        assert_eq!(last.timestamp.time(), records.last().unwrap().timestamp.time());
    }

    #[test]
    fn earliest_at_midnight_is_its_own_boundary() {
        let records = vec![rec(at(1, 0, 0), 100.0), rec(at(2, 0, 0), 200.0), rec(at(3, 0, 0), 400.0)];
        let rows = resample_daily(&records);
        let cases: Vec<f64> = rows.iter().map(|r| r.counts.cumulative_cases).collect();
        assert_eq!(cases, vec![100.0, 200.0, 400.0]);
        assert_eq!(rows[0].timestamp, at(1, 0, 0));
    }

    #[test]
    fn picks_nearest_reading_for_each_target() {
        // Readings at 00, 06, 12, 18 on Nov 1-3, then a final reading at 10:00 on
        // Nov 4 which fixes the target time-of-day to 10:00.
        let mut records = Vec::new();
        for day in 1..=3 {
            for hour in [0, 6, 12, 18] {
                records.push(rec(at(day, hour, 0), f64::from(day * 100 + hour)));
            }
        }
        records.push(rec(at(4, 10, 0), 999.0));

        let rows = resample_daily(&records);
        let targets: Vec<_> = rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(targets, vec![at(1, 10, 0), at(2, 10, 0), at(3, 10, 0), at(4, 10, 0)]);

        // 10:00 is 2h from the 12:00 reading and 4h from the 06:00 one.
        assert_eq!(rows[0].counts.cumulative_cases, 112.0);
        assert_eq!(rows[1].counts.cumulative_cases, 212.0);
        assert_eq!(rows[2].counts.cumulative_cases, 312.0);
        assert_eq!(rows[3].counts.cumulative_cases, 999.0);
    }

    #[test]
    fn ties_resolve_to_earlier_reading() {
        let records = vec![rec(at(1, 6, 0), 1.0), rec(at(1, 14, 0), 2.0), rec(at(2, 0, 0), 3.0)];
        // Target 10:00 is exactly 4h from both neighbors.
        assert_eq!(nearest_index(&records, at(1, 10, 0), 0), Some(0));
        assert_eq!(nearest_index(&records, at(1, 10, 1), 0), Some(1));
        assert_eq!(nearest_index(&records, at(5, 0, 0), 0), Some(2));
        assert_eq!(nearest_index(&records, at(1, 0, 0), 3), None);
    }

    #[test]
    fn repeated_timestamps_do_not_stop_the_scan() {
        let records = vec![rec(at(1, 0, 0), 1.0), rec(at(1, 0, 0), 2.0), rec(at(5, 0, 0), 3.0)];
        assert_eq!(nearest_index(&records, at(5, 0, 0), 0), Some(2));
        assert_eq!(nearest_index(&records, at(1, 0, 0), 0), Some(0));
    }

    #[test]
    fn sort_and_dedup_keeps_first_occurrence() {
        let mut records = vec![
            rec(at(3, 0, 0), 30.0),
            rec(at(1, 0, 0), 10.0),
            rec(at(3, 0, 0), 31.0),
            rec(at(2, 0, 0), 20.0),
        ];
        let dropped = sort_and_dedup(&mut records);
        assert_eq!(dropped, 1);
        let cases: Vec<f64> = records.iter().map(|r| r.counts.cumulative_cases).collect();
        assert_eq!(cases, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn row_count_matches_daily_steps() {
        let records = vec![rec(at(1, 9, 30), 1.0), rec(at(20, 9, 30), 2.0)];
        let rows = resample_daily(&records);
        // Nov 2 09:30 ..= Nov 20 09:30
        assert_eq!(rows.len(), 19);
        assert!(rows[..9].iter().all(|r| r.counts.cumulative_cases == 1.0));
        assert!(rows[10..].iter().all(|r| r.counts.cumulative_cases == 2.0));
    }
}
