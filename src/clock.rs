// Minute-aligned window arithmetic. Windows are half-open [from, to) and
// always end at a whole-minute boundary; sub-minute precision is not offered.

use chrono::{DateTime, Duration, Local};

/// Floor of `t` to its minute boundary.
pub fn minute_floor(t: DateTime<Local>) -> DateTime<Local> {
    let overshoot = Duration::seconds(t.timestamp().rem_euclid(60))
        + Duration::nanoseconds(t.timestamp_subsec_nanos() as i64);
    t - overshoot
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Local>,
    pub to: DateTime<Local>,
}

impl TimeWindow {
    /// Window of `span_minutes` whole minutes ending at the minute floor of
    /// `now`. `span_minutes` must be >= 1 (enforced at config validation).
    pub fn ending_at(now: DateTime<Local>, span_minutes: u32) -> Self {
        debug_assert!(span_minutes >= 1);
        let to = minute_floor(now);
        let from = to - Duration::minutes(span_minutes as i64);
        Self { from, to }
    }

    pub fn since_unix(&self) -> i64 {
        self.from.timestamp()
    }

    pub fn until_unix(&self) -> i64 {
        self.to.timestamp()
    }

    /// Instant a recorded point is attributed to: the start of the minute
    /// immediately preceding the window end. Samples lag wall-clock time by
    /// one window on purpose.
    pub fn sample_instant(&self) -> DateTime<Local> {
        self.to - Duration::minutes(1)
    }
}

/// Storage label of a point: `yyyymmddHHMM`.
pub fn format_label(t: &DateTime<Local>) -> String {
    t.format("%Y%m%d%H%M").to_string()
}

/// Calendar-day component of a daily series key: `yyyymmdd`.
pub fn format_day(t: &DateTime<Local>) -> String {
    t.format("%Y%m%d").to_string()
}
