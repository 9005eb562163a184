// Typed real-time notifications
//
// In-process fan-out of the events the backend pushes over its socket.
// Subscribers get a bounded channel with optional event-type filtering;
// slow consumers drop events rather than stall the feed. Events that
// reference a navigable entity map to the highlight query parameters the
// resulting navigation carries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::params::{keys, NavParams};

/// A typed event pushed by the coaching backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NotificationEvent {
    /// A result row was recorded for a test; the row id is not known to the
    /// backend at publish time, only the test id.
    #[serde(rename = "test:result:registered")]
    TestResultRegistered {
        test_id: String,
        test_name: String,
        recorded_at: DateTime<Utc>,
    },
    #[serde(rename = "exam:created")]
    ExamCreated {
        exam_id: String,
        exam_name: String,
        created_at: DateTime<Utc>,
    },
    #[serde(rename = "plan:assigned")]
    PlanAssigned {
        plan_id: String,
        plan_name: String,
        assigned_at: DateTime<Utc>,
    },
    #[serde(rename = "user:updated")]
    UserUpdated {
        user_id: String,
        user_name: String,
        updated_at: DateTime<Utc>,
    },
    #[serde(rename = "payment:received")]
    PaymentReceived {
        payment_id: String,
        received_at: DateTime<Utc>,
    },
    #[serde(rename = "subscription:renewed")]
    SubscriptionRenewed {
        subscription_id: String,
        renewed_at: DateTime<Utc>,
    },
    /// Patches the visible avatar in place; no navigation involved.
    #[serde(rename = "user:avatar:updated")]
    AvatarUpdated { user_id: String, image_url: String },
}

impl NotificationEvent {
    /// Wire name, used for subscription filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TestResultRegistered { .. } => "test:result:registered",
            Self::ExamCreated { .. } => "exam:created",
            Self::PlanAssigned { .. } => "plan:assigned",
            Self::UserUpdated { .. } => "user:updated",
            Self::PaymentReceived { .. } => "payment:received",
            Self::SubscriptionRenewed { .. } => "subscription:renewed",
            Self::AvatarUpdated { .. } => "user:avatar:updated",
        }
    }

    /// Query parameters for the navigation this event triggers, or `None`
    /// for events that patch visible state directly.
    pub fn nav_params(&self) -> Option<NavParams> {
        let mut params = NavParams::new();
        match self {
            Self::TestResultRegistered {
                test_id,
                test_name,
                recorded_at,
            } => {
                params.set(keys::HIGHLIGHT_TEST_BY_TIME, test_id);
                params.set(keys::TEST_NAME, test_name);
                params.set(keys::TEST_TIMESTAMP, recorded_at.to_rfc3339());
            }
            Self::ExamCreated {
                exam_id,
                exam_name,
                created_at,
            } => {
                params.set(keys::HIGHLIGHT_EXAM, exam_id);
                params.set(keys::EXAM_NAME, exam_name);
                params.set(
                    keys::NOTIFICATION_TIME,
                    created_at.timestamp_millis().to_string(),
                );
            }
            Self::PlanAssigned {
                plan_id,
                plan_name,
                assigned_at,
            } => {
                params.set(keys::HIGHLIGHT_PLAN, plan_id);
                params.set(keys::PLAN_NAME, plan_name);
                params.set(
                    keys::NOTIFICATION_TIME,
                    assigned_at.timestamp_millis().to_string(),
                );
            }
            Self::UserUpdated {
                user_id,
                user_name,
                updated_at,
            } => {
                params.set(keys::HIGHLIGHT_USER, user_id);
                params.set(keys::USER_NAME, user_name);
                params.set(
                    keys::NOTIFICATION_TIME,
                    updated_at.timestamp_millis().to_string(),
                );
            }
            Self::PaymentReceived {
                payment_id,
                received_at,
            } => {
                params.set(keys::HIGHLIGHT_PAYMENT, payment_id);
                params.set(
                    keys::NOTIFICATION_TIME,
                    received_at.timestamp_millis().to_string(),
                );
            }
            Self::SubscriptionRenewed {
                subscription_id,
                renewed_at,
            } => {
                params.set(keys::HIGHLIGHT_SUBSCRIPTION, subscription_id);
                params.set(
                    keys::NOTIFICATION_TIME,
                    renewed_at.timestamp_millis().to_string(),
                );
            }
            Self::AvatarUpdated { .. } => return None,
        }
        Some(params)
    }
}

/// Subscription information
#[derive(Debug, Clone)]
struct Subscription {
    id: String,
    event_types: Vec<String>,
    sender: mpsc::Sender<NotificationEvent>,
}

/// Feed statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationBusStats {
    pub total_published: u64,
    pub total_delivered: u64,
    pub dropped_events: u64,
    pub active_subscriptions: usize,
}

/// Fan-out bus for notification events.
pub struct NotificationBus {
    subscriptions: Arc<DashMap<String, Subscription>>,
    stats: Arc<RwLock<NotificationBusStats>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl NotificationBus {
    /// `capacity` bounds each subscription's channel.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscriptions: Arc::new(DashMap::new()),
            stats: Arc::new(RwLock::new(NotificationBusStats::default())),
            next_id: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe with event-type filtering; an empty filter receives every
    /// event.
    pub fn subscribe(
        &self,
        event_types: Vec<String>,
    ) -> (String, mpsc::Receiver<NotificationEvent>) {
        let subscription_id = format!("sub_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscriptions.insert(
            subscription_id.clone(),
            Subscription {
                id: subscription_id.clone(),
                event_types,
                sender: tx,
            },
        );
        info!("created notification subscription {subscription_id}");
        (subscription_id, rx)
    }

    pub fn unsubscribe(&self, subscription_id: &str) {
        if self.subscriptions.remove(subscription_id).is_some() {
            info!("removed notification subscription {subscription_id}");
        }
    }

    /// Fan out to all matching subscriptions; returns the delivery count.
    /// Full client queues drop the event rather than block the feed.
    pub async fn publish(&self, event: NotificationEvent) -> u64 {
        debug!("publishing {}", event.event_type());
        let mut delivered = 0u64;
        let mut dropped = 0u64;
        let mut closed: Vec<String> = Vec::new();

        for entry in self.subscriptions.iter() {
            let sub = entry.value();
            if !sub.event_types.is_empty()
                && !sub.event_types.iter().any(|t| t == event.event_type())
            {
                continue;
            }
            match sub.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    warn!("dropped event for slow subscription {}", sub.id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dropped += 1;
                    closed.push(sub.id.clone());
                }
            }
        }

        for id in closed {
            self.subscriptions.remove(&id);
        }

        let mut stats = self.stats.write().await;
        stats.total_published += 1;
        stats.total_delivered += delivered;
        stats.dropped_events += dropped;
        stats.active_subscriptions = self.subscriptions.len();

        delivered
    }

    pub async fn stats(&self) -> NotificationBusStats {
        let mut stats = self.stats.read().await.clone();
        stats.active_subscriptions = self.subscriptions.len();
        stats
    }
}
