//! Interval arithmetic — mapping wall-clock time onto the weekly rotation.
//!
//! Every interval is exactly seven days long and starts at a fixed weekday and
//! hour (the *anchor*). Deployments pick the anchor through configuration;
//! there is no implicit default.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Days in one rotation interval.
pub const INTERVAL_DAYS: i64 = 7;

/// Length of one rotation interval.
pub fn interval_length() -> TimeDelta { TimeDelta::days(INTERVAL_DAYS) }

// ─── Anchor ──────────────────────────────────────────────────────────────────

/// The weekday/hour at which a new interval begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
  /// Intervals start on Monday at 00:00:00 UTC.
  MondayMidnight,
  /// Intervals start on Saturday at 20:00:00 UTC.
  SaturdayEvening,
}

impl AnchorPolicy {
  pub fn weekday(self) -> Weekday {
    match self {
      Self::MondayMidnight => Weekday::Mon,
      Self::SaturdayEvening => Weekday::Sat,
    }
  }

  /// Hour of day (UTC) at which the interval flips.
  pub fn hour(self) -> i64 {
    match self {
      Self::MondayMidnight => 0,
      Self::SaturdayEvening => 20,
    }
  }
}

// ─── Calculator ──────────────────────────────────────────────────────────────

/// The canonical start of the interval containing `now`.
///
/// Walks back to the most recent anchor weekday, moves to the anchor hour,
/// and steps back one more week if `now` has not reached that moment yet.
pub fn current_interval_start(anchor: AnchorPolicy, now: DateTime<Utc>) -> DateTime<Utc> {
  let today = i64::from(now.weekday().num_days_from_monday());
  let target = i64::from(anchor.weekday().num_days_from_monday());
  let delta = (today - target).rem_euclid(7);

  let candidate = (now.date_naive() - TimeDelta::days(delta))
    .and_time(NaiveTime::MIN)
    .and_utc()
    + TimeDelta::hours(anchor.hour());

  if now < candidate { candidate - interval_length() } else { candidate }
}

/// The start of the interval following the one containing `now`.
pub fn next_interval_start(anchor: AnchorPolicy, now: DateTime<Utc>) -> DateTime<Utc> {
  current_interval_start(anchor, now) + interval_length()
}

// ─── Countdown ───────────────────────────────────────────────────────────────

/// Whole time units left until the next interval boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
  pub days:    i64,
  pub hours:   i64,
  pub minutes: i64,
  pub seconds: i64,
}

impl TimeRemaining {
  pub fn from_delta(delta: TimeDelta) -> Self {
    let total = delta.num_seconds().max(0);
    Self {
      days:    total / 86_400,
      hours:   (total % 86_400) / 3_600,
      minutes: (total % 3_600) / 60,
      seconds: total % 60,
    }
  }
}

pub fn time_remaining(anchor: AnchorPolicy, now: DateTime<Utc>) -> TimeRemaining {
  TimeRemaining::from_delta(next_interval_start(anchor, now) - now)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
  }

  // 2024-06-03 is a Monday, 2024-06-08 a Saturday.

  #[test]
  fn monday_anchor_truncates_to_midnight() {
    let start = current_interval_start(AnchorPolicy::MondayMidnight, at(2024, 6, 5, 13, 45, 10));
    assert_eq!(start, at(2024, 6, 3, 0, 0, 0));
  }

  #[test]
  fn monday_anchor_on_the_boundary() {
    let a = AnchorPolicy::MondayMidnight;
    assert_eq!(current_interval_start(a, at(2024, 6, 3, 0, 0, 0)), at(2024, 6, 3, 0, 0, 0));
    assert_eq!(current_interval_start(a, at(2024, 6, 2, 23, 59, 59)), at(2024, 5, 27, 0, 0, 0));
  }

  #[test]
  fn monday_anchor_drops_subsecond_precision() {
    let now = at(2024, 6, 4, 9, 0, 0) + TimeDelta::milliseconds(789);
    let start = current_interval_start(AnchorPolicy::MondayMidnight, now);
    assert_eq!(start.timestamp_subsec_nanos(), 0);
  }

  #[test]
  fn saturday_anchor_after_eight_pm() {
    let start = current_interval_start(AnchorPolicy::SaturdayEvening, at(2024, 6, 8, 21, 0, 0));
    assert_eq!(start, at(2024, 6, 8, 20, 0, 0));
  }

  #[test]
  fn saturday_anchor_before_eight_pm_uses_previous_week() {
    let start = current_interval_start(AnchorPolicy::SaturdayEvening, at(2024, 6, 8, 19, 59, 59));
    assert_eq!(start, at(2024, 6, 1, 20, 0, 0));
  }

  #[test]
  fn saturday_anchor_midweek() {
    let a = AnchorPolicy::SaturdayEvening;
    assert_eq!(current_interval_start(a, at(2024, 6, 3, 8, 0, 0)), at(2024, 6, 1, 20, 0, 0));
    assert_eq!(current_interval_start(a, at(2024, 6, 7, 23, 0, 0)), at(2024, 6, 1, 20, 0, 0));
    assert_eq!(current_interval_start(a, at(2024, 6, 9, 0, 30, 0)), at(2024, 6, 8, 20, 0, 0));
  }

  #[test]
  fn stable_within_window_and_steps_at_boundary() {
    for anchor in [AnchorPolicy::MondayMidnight, AnchorPolicy::SaturdayEvening] {
      let start = current_interval_start(anchor, at(2024, 6, 5, 12, 0, 0));
      let mut t = start;
      while t < start + interval_length() {
        assert_eq!(current_interval_start(anchor, t), start, "{anchor:?} at {t}");
        t += TimeDelta::hours(5);
      }
      let last = start + interval_length() - TimeDelta::seconds(1);
      assert_eq!(current_interval_start(anchor, last), start);
      assert_eq!(current_interval_start(anchor, start + interval_length()), start + interval_length());
    }
  }

  #[test]
  fn monotonic_over_a_month() {
    for anchor in [AnchorPolicy::MondayMidnight, AnchorPolicy::SaturdayEvening] {
      let mut t = at(2024, 2, 20, 0, 0, 0);
      let mut prev = current_interval_start(anchor, t);
      for _ in 0..(24 * 40) {
        t += TimeDelta::minutes(61);
        let cur = current_interval_start(anchor, t);
        assert!(cur >= prev);
        assert!(cur <= t && t < cur + interval_length());
        prev = cur;
      }
    }
  }

  #[test]
  fn next_is_one_week_later() {
    let now = at(2024, 12, 31, 18, 0, 0);
    for anchor in [AnchorPolicy::MondayMidnight, AnchorPolicy::SaturdayEvening] {
      assert_eq!(
        next_interval_start(anchor, now),
        current_interval_start(anchor, now) + TimeDelta::days(7)
      );
    }
  }

  #[test]
  fn remaining_breaks_down_into_units() {
    // Wednesday 10:29:30 → next Monday 00:00:00.
    let left = time_remaining(AnchorPolicy::MondayMidnight, at(2024, 6, 5, 10, 29, 30));
    assert_eq!(left, TimeRemaining { days: 4, hours: 13, minutes: 30, seconds: 30 });
  }

  #[test]
  fn anchor_names_in_config() {
    let parsed: AnchorPolicy = serde_json::from_str("\"saturday_evening\"").unwrap();
    assert_eq!(parsed, AnchorPolicy::SaturdayEvening);
  }
}
