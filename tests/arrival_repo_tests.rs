// ArrivalRepo terminal-signal policy: end-of-stream resolves the count, any
// error or dead connection resolves to missing data, first signal wins.

mod common;

use chrono::Local;
use common::{Script, ScriptedConnector, test_relay};
use ratewatch::arrival_repo::ArrivalRepo;
use ratewatch::clock::TimeWindow;
use ratewatch::models::SampleCount;
use ratewatch::relay_client::StreamSignal;
use std::sync::Arc;

fn repo(script: Script) -> ArrivalRepo {
    ArrivalRepo::new(Arc::new(ScriptedConnector::all(script)), vec![1])
}

fn window() -> TimeWindow {
    TimeWindow::ending_at(Local::now(), 1)
}

#[tokio::test]
async fn events_then_end_of_stream_resolve_to_count() {
    let repo = repo(Script::Signals(vec![
        StreamSignal::Event,
        StreamSignal::Event,
        StreamSignal::Event,
        StreamSignal::EndOfStream,
    ]));
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Known(3));
}

#[tokio::test]
async fn empty_stream_is_a_real_zero() {
    let repo = repo(Script::Signals(vec![StreamSignal::EndOfStream]));
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Known(0));
}

#[tokio::test]
async fn error_discards_partial_count() {
    // Three events were observed, but the stream failed before end-of-stream:
    // the whole sample is untrusted.
    let repo = repo(Script::Signals(vec![
        StreamSignal::Event,
        StreamSignal::Event,
        StreamSignal::Event,
        StreamSignal::Error("connection reset".into()),
    ]));
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Unknown);
}

#[tokio::test]
async fn error_before_any_event_is_unknown() {
    let repo = repo(Script::Signals(vec![StreamSignal::Error("refused".into())]));
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Unknown);
}

#[tokio::test]
async fn first_terminal_signal_wins() {
    // A late error after end-of-stream must not override the resolved count.
    let repo = repo(Script::Signals(vec![
        StreamSignal::Event,
        StreamSignal::EndOfStream,
        StreamSignal::Error("too late".into()),
    ]));
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Known(1));
}

#[tokio::test]
async fn connect_failure_is_unknown() {
    let repo = repo(Script::FailConnect);
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Unknown);
}

#[tokio::test]
async fn subscribe_failure_is_unknown() {
    let repo = repo(Script::FailSubscribe);
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Unknown);
}

#[tokio::test]
async fn stream_dying_without_terminal_is_unknown() {
    let repo = repo(Script::Signals(vec![
        StreamSignal::Event,
        StreamSignal::Event,
    ]));
    let count = repo.count(&test_relay("a"), &window()).await;
    assert_eq!(count, SampleCount::Unknown);
}
