use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use spotlight_core::params::keys;
use spotlight_core::{
    CandidateItem, EntityKind, Highlighter, MatchPolicy, NavParams, NavigationSink, Result,
};
use tokio::sync::Mutex;

// Sink that records every replacement it is asked to perform
#[derive(Default)]
struct RecordingSink {
    replaced: Mutex<Vec<NavParams>>,
}

#[async_trait]
impl NavigationSink for RecordingSink {
    async fn replace_params(&self, params: NavParams) -> Result<()> {
        self.replaced.lock().await.push(params);
        Ok(())
    }
}

impl RecordingSink {
    async fn calls(&self) -> Vec<NavParams> {
        self.replaced.lock().await.clone()
    }
}

fn highlighter() -> (Highlighter, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let h = Highlighter::new(Arc::clone(&sink) as Arc<dyn NavigationSink>, MatchPolicy::default());
    (h, sink)
}

fn test_params() -> NavParams {
    NavParams::new()
        .with(keys::HIGHLIGHT_TEST, "test_123")
        .with(keys::TEST_NAME, "VO2 Máximo")
        .with(keys::NOTIFICATION_TIME, "1700000000000")
        .with("tab", "results")
}

#[tokio::test]
async fn params_without_triggers_stay_inactive() {
    let (h, sink) = highlighter();
    h.apply_params(NavParams::new().with("tab", "results")).await;

    assert!(!h.is_highlighting().await);
    assert!(!h.should_highlight("test_123", None, None).await);
    // clearing an inactive highlighter emits nothing
    h.clear().await.expect("clear");
    assert!(sink.calls().await.is_empty());
}

#[tokio::test]
async fn end_to_end_exact_test_scenario() {
    let (h, _sink) = highlighter();
    h.apply_params(test_params()).await;

    assert!(h.is_highlighting().await);
    assert!(
        h.should_highlight("test_123", Some(EntityKind::Test), Some("VO2 Máximo"))
            .await
    );
    assert!(
        !h.should_highlight("test_999", Some(EntityKind::Test), Some("Outro"))
            .await
    );
}

#[tokio::test]
async fn clear_strips_parameters_and_is_idempotent() {
    let (h, sink) = highlighter();
    h.apply_params(test_params()).await;

    h.clear().await.expect("clear");
    assert!(!h.is_highlighting().await);

    let calls = sink.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].has_highlight());
    assert_eq!(calls[0].get("tab"), Some("results"));
    assert_eq!(calls[0].len(), 1);

    // second clear: state identical, no second replacement
    h.clear().await.expect("clear");
    assert!(!h.is_highlighting().await);
    assert_eq!(sink.calls().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn highlight_expires_after_the_window() {
    let (h, sink) = highlighter();
    h.apply_params(test_params()).await;
    assert!(h.is_highlighting().await);

    // just before the 10s window
    tokio::time::sleep(Duration::from_millis(9_900)).await;
    assert!(h.is_highlighting().await);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!h.is_highlighting().await);
    assert!(
        !h.should_highlight("test_123", Some(EntityKind::Test), Some("VO2 Máximo"))
            .await
    );

    let calls = sink.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].has_highlight());
}

#[tokio::test(start_paused = true)]
async fn explicit_clear_cancels_the_expiry_timer() {
    let (h, sink) = highlighter();
    h.apply_params(test_params()).await;
    h.clear().await.expect("clear");

    tokio::time::sleep(Duration::from_secs(30)).await;
    // the aborted timer never produced a second replacement
    assert_eq!(sink.calls().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn renavigation_restarts_the_expiry_timer() {
    let (h, sink) = highlighter();
    h.apply_params(test_params()).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    h.apply_params(
        NavParams::new()
            .with(keys::HIGHLIGHT_EXAM, "exam_1")
            .with(keys::EXAM_NAME, "Maratona"),
    )
    .await;

    // 6s later the first navigation's window would have elapsed
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(h.is_highlighting().await);
    assert!(
        h.should_highlight("exam_1", Some(EntityKind::Exam), Some("Maratona de SP"))
            .await
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!h.is_highlighting().await);
    assert_eq!(sink.calls().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn expiry_window_follows_the_policy() {
    let sink = Arc::new(RecordingSink::default());
    let policy = MatchPolicy {
        expiry_ms: 2_000,
        ..MatchPolicy::default()
    };
    let h = Highlighter::new(Arc::clone(&sink) as Arc<dyn NavigationSink>, policy);
    h.apply_params(test_params()).await;

    tokio::time::sleep(Duration::from_millis(2_100)).await;
    assert!(!h.is_highlighting().await);
}

#[tokio::test]
async fn time_correlated_queries_go_through_the_policy() {
    let (h, _sink) = highlighter();
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    h.apply_params(
        NavParams::new()
            .with(keys::HIGHLIGHT_TEST_BY_TIME, "test_123")
            .with(keys::TEST_TIMESTAMP, t0.to_rfc3339()),
    )
    .await;

    let candidates = vec![
        CandidateItem::new("res_a", Some(t0 + chrono::Duration::seconds(30))),
        CandidateItem::new("res_b", Some(t0 + chrono::Duration::seconds(120))),
    ];
    let inside = t0 + chrono::Duration::milliseconds(30_500);
    assert!(
        h.should_highlight_by_time("test_123", None, Some(inside), &candidates)
            .await
    );
    assert!(
        !h.should_highlight_by_time("test_999", None, Some(inside), &candidates)
            .await
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_highlighter_aborts_the_timer() {
    let sink = Arc::new(RecordingSink::default());
    {
        let h = Highlighter::new(
            Arc::clone(&sink) as Arc<dyn NavigationSink>,
            MatchPolicy::default(),
        );
        h.apply_params(test_params()).await;
    }
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(sink.calls().await.is_empty());
}
