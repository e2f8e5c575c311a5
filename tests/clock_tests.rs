// Window arithmetic: minute alignment, span handling, label formats

use chrono::{DateTime, Duration, Local, TimeZone, Timelike};
use ratewatch::clock::{self, TimeWindow};

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .expect("unambiguous local time")
}

#[test]
fn minute_floor_drops_seconds() {
    let t = local(2024, 7, 8, 12, 34, 56);
    let floored = clock::minute_floor(t);
    assert_eq!(floored, local(2024, 7, 8, 12, 34, 0));
    assert_eq!(floored.second(), 0);
}

#[test]
fn minute_floor_is_idempotent_on_aligned_times() {
    let t = local(2024, 7, 8, 12, 0, 0);
    assert_eq!(clock::minute_floor(t), t);
}

#[test]
fn window_spans_are_minute_aligned_and_ordered() {
    let now = local(2024, 7, 8, 12, 34, 56);
    for span in [1u32, 5, 10, 60, 1440] {
        let window = TimeWindow::ending_at(now, span);
        assert_eq!(window.to, local(2024, 7, 8, 12, 34, 0));
        assert_eq!(window.from, window.to - Duration::minutes(span as i64));
        assert!(window.from < window.to, "span {span}");
        assert_eq!(window.since_unix() % 60, 0);
        assert_eq!(window.until_unix() % 60, 0);
        assert_eq!(
            window.until_unix() - window.since_unix(),
            (span as i64) * 60
        );
    }
}

#[test]
fn sample_instant_lags_one_minute_behind_window_end() {
    let window = TimeWindow::ending_at(local(2024, 7, 8, 9, 5, 30), 1);
    let stamp = window.sample_instant();
    assert_eq!(stamp, local(2024, 7, 8, 9, 4, 0));
    // With a one-minute span, the recorded instant is the window start.
    assert_eq!(stamp, window.from);
}

#[test]
fn labels_and_day_keys_format_as_stored() {
    let stamp = local(2024, 7, 8, 9, 4, 0);
    assert_eq!(clock::format_label(&stamp), "202407080904");
    assert_eq!(clock::format_day(&stamp), "20240708");
}

#[test]
fn midnight_window_labels_belong_to_the_previous_day() {
    // A tick just after midnight records the last minute of the previous day.
    let window = TimeWindow::ending_at(local(2024, 7, 9, 0, 0, 2), 1);
    let stamp = window.sample_instant();
    assert_eq!(clock::format_label(&stamp), "202407082359");
    assert_eq!(clock::format_day(&stamp), "20240708");
}
