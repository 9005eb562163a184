mod config;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use config::SimConfig;
use spotlight_core::{
    CandidateItem, EntityKind, Highlighter, MatchPolicy, NavParams, NavigationSink,
    NotificationBus, NotificationEvent,
};
use tracing::info;

/// Stand-in for the router: logs the replacement instead of navigating.
struct LogSink;

#[async_trait]
impl NavigationSink for LogSink {
    async fn replace_params(&self, params: NavParams) -> spotlight_core::Result<()> {
        info!(target: "notify_sim", "navigation replaced: ?{}", params.to_query());
        Ok(())
    }
}

/// Rows the dashboard would be rendering, per entity kind.
const ROSTER: &[(&str, EntityKind, &str)] = &[
    ("test_123", EntityKind::Test, "VO2 Máximo"),
    ("test_999", EntityKind::Test, "Outro"),
    ("exam_1", EntityKind::Exam, "Maratona de SP"),
    ("plan_7", EntityKind::Plan, "Plano Trimestral"),
    ("user_42", EntityKind::User, "Ana Souza"),
];

fn next_event(step: usize) -> NotificationEvent {
    let now = Utc::now();
    match step % 5 {
        0 => NotificationEvent::TestResultRegistered {
            test_id: "test_123".to_string(),
            test_name: "VO2 Máximo".to_string(),
            recorded_at: now,
        },
        1 => NotificationEvent::ExamCreated {
            exam_id: "exam_1".to_string(),
            exam_name: "Maratona de SP".to_string(),
            created_at: now,
        },
        2 => NotificationEvent::PaymentReceived {
            payment_id: format!("pay_{step}"),
            received_at: now,
        },
        3 => NotificationEvent::AvatarUpdated {
            user_id: "user_42".to_string(),
            image_url: format!("https://cdn.example.com/avatars/user_42/{step}.png"),
        },
        _ => NotificationEvent::SubscriptionRenewed {
            subscription_id: format!("subscr_{step}"),
            renewed_at: now,
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,spotlight_core=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let cfg = SimConfig::from_env();
    info!(target: "notify_sim", "starting notification simulator: {cfg:?}");

    let bus = Arc::new(NotificationBus::new(cfg.bus_capacity));
    let highlighter = Highlighter::new(Arc::new(LogSink), MatchPolicy::from_env());

    // Monitor subscription: every event type
    let (_sub_id, mut rx) = bus.subscribe(vec![]);

    // Simulated backend feed
    let feed_bus = Arc::clone(&bus);
    let tick = cfg.tick;
    let event_count = cfg.event_count;
    let feed_task = tokio::spawn(async move {
        for step in 0..event_count {
            feed_bus.publish(next_event(step)).await;
            tokio::time::sleep(tick).await;
        }
    });

    // Result rows accumulate as the feed registers them
    let mut results: Vec<CandidateItem> = Vec::new();

    for _ in 0..cfg.event_count {
        let Some(event) = rx.recv().await else { break };
        info!(target: "notify_sim", "received {}", event.event_type());

        if let NotificationEvent::TestResultRegistered { recorded_at, .. } = &event {
            results.push(CandidateItem::new(
                format!("result_{}", results.len()),
                Some(*recorded_at),
            ));
        }

        let Some(params) = event.nav_params() else {
            info!(target: "notify_sim", "direct state patch, no navigation");
            continue;
        };
        info!(target: "notify_sim", "navigating with ?{}", params.to_query());
        highlighter.apply_params(params).await;

        for (id, kind, name) in ROSTER.iter().copied() {
            let emphasized = match &event {
                NotificationEvent::TestResultRegistered { .. } => {
                    let row_time = results.last().and_then(|r| r.recorded_at);
                    highlighter
                        .should_highlight_by_time(id, Some(name), row_time, &results)
                        .await
                }
                _ => highlighter.should_highlight(id, Some(kind), Some(name)).await,
            };
            if emphasized {
                info!(target: "notify_sim", "highlight: {} ({})", name, id);
            }
        }

        highlighter.clear().await?;
    }

    feed_task.abort();
    let stats = bus.stats().await;
    info!(target: "notify_sim", "feed stats: {}", serde_json::to_string(&stats)?);
    Ok(())
}
