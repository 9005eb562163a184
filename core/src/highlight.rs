// Highlight lifecycle
//
// One highlighter per view instance. Owns the single active reference, a
// snapshot of the parameters it was derived from, and the one-shot expiry
// timer. Clearing and expiry both strip the highlight keys from the
// navigation state through the injected sink.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::matcher::{CandidateItem, MatchPolicy};
use crate::params::NavParams;
use crate::reference::{EntityKind, HighlightReference};
use crate::Result;

// Type alias matching the shared-state convention used across the crate
type Shared<T> = Arc<RwLock<T>>;

/// Receives the replacement parameter set when a highlight is cleared.
///
/// Implementations must replace the current navigation entry rather than
/// push a new one, so back-navigation is not polluted and a page refresh
/// does not re-trigger the highlight.
#[async_trait]
pub trait NavigationSink: Send + Sync {
    async fn replace_params(&self, params: NavParams) -> Result<()>;
}

/// Per-view highlight state with auto-expiry.
///
/// The expiry timer is a one-shot task armed when a reference becomes
/// active. It is aborted on explicit clear, on re-navigation, and on drop,
/// so it can never fire into a torn-down view.
pub struct Highlighter {
    state: Shared<Option<HighlightReference>>,
    params: Shared<NavParams>,
    expiry_task: Mutex<Option<JoinHandle<()>>>,
    sink: Arc<dyn NavigationSink>,
    policy: MatchPolicy,
}

impl Highlighter {
    pub fn new(sink: Arc<dyn NavigationSink>, policy: MatchPolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(None)),
            params: Arc::new(RwLock::new(NavParams::new())),
            expiry_task: Mutex::new(None),
            sink,
            policy,
        }
    }

    /// Re-derive the reference from a fresh set of navigation parameters.
    /// Called on every parameter change; a pending expiry timer from the
    /// previous navigation is canceled first.
    pub async fn apply_params(&self, params: NavParams) {
        self.cancel_expiry().await;
        let reference = HighlightReference::parse(&params);
        *self.params.write().await = params;
        let active = reference.is_some();
        if let Some(r) = &reference {
            debug!(
                kind = r.kind.as_str(),
                id = r.entity_id.as_deref().unwrap_or(""),
                time_correlated = r.time_correlated,
                "highlight activated"
            );
        }
        *self.state.write().await = reference;
        if active {
            self.arm_expiry().await;
        }
    }

    /// Cancel the expiry timer and deactivate. Safe to call repeatedly: an
    /// already-inactive highlighter stays untouched and emits nothing.
    pub async fn clear(&self) -> Result<()> {
        self.cancel_expiry().await;
        deactivate(&self.state, &self.params, &self.sink).await
    }

    pub async fn is_highlighting(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Snapshot of the active reference, if any.
    pub async fn reference(&self) -> Option<HighlightReference> {
        self.state.read().await.clone()
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Should the given list item be emphasized right now?
    pub async fn should_highlight(
        &self,
        item_id: &str,
        item_kind: Option<EntityKind>,
        item_name: Option<&str>,
    ) -> bool {
        match self.state.read().await.as_ref() {
            Some(reference) => reference.matches(item_id, item_kind, item_name),
            None => false,
        }
    }

    /// Time-correlated variant; see [`HighlightReference::matches_by_time`].
    pub async fn should_highlight_by_time(
        &self,
        item_id: &str,
        item_name: Option<&str>,
        item_time: Option<DateTime<Utc>>,
        candidates: &[CandidateItem],
    ) -> bool {
        match self.state.read().await.as_ref() {
            Some(reference) => {
                reference.matches_by_time(item_id, item_name, item_time, candidates, &self.policy)
            }
            None => false,
        }
    }

    async fn arm_expiry(&self) {
        let state = Arc::clone(&self.state);
        let params = Arc::clone(&self.params);
        let sink = Arc::clone(&self.sink);
        let window = self.policy.expiry();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            debug!("highlight expired");
            if let Err(e) = deactivate(&state, &params, &sink).await {
                warn!("navigation update on highlight expiry failed: {e}");
            }
        });
        *self.expiry_task.lock().await = Some(handle);
    }

    async fn cancel_expiry(&self) {
        if let Some(handle) = self.expiry_task.lock().await.take() {
            handle.abort();
        }
    }
}

impl Drop for Highlighter {
    fn drop(&mut self) {
        // &mut self guarantees no other lock holder
        if let Ok(mut guard) = self.expiry_task.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

// Shared by explicit clear and the expiry task. Deactivation happens at
// most once per navigation: whichever path takes the reference first sends
// the stripped parameters, the other is a no-op.
async fn deactivate(
    state: &Shared<Option<HighlightReference>>,
    params: &Shared<NavParams>,
    sink: &Arc<dyn NavigationSink>,
) -> Result<()> {
    let was_active = state.write().await.take().is_some();
    if !was_active {
        return Ok(());
    }
    let stripped = {
        let mut guard = params.write().await;
        guard.strip_highlight();
        guard.clone()
    };
    debug!("highlight cleared, parameters stripped");
    sink.replace_params(stripped).await
}
