//! In-process change bus over the shared dashboard store.
//!
//! Every dashboard context reads and writes the same underlying state (leave
//! applications, role inboxes, attendance control). [`ChangeBus`] is the
//! signal plane for those writes: a `tokio::sync::broadcast` channel carrying
//! typed [`StoreEvent`]s, one topic per entity. Writers tag events with their
//! [`ContextId`] so a subscriber can ignore its own echo, and every topic
//! with at least one subscriber gets a single reference-counted
//! reconciliation ticker (default 1 s) for contexts that missed a signal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::workflows::roles::Role;

/// Identity of one dashboard context sharing the store.
///
/// A context is one independently-operating consumer: a dashboard session, a
/// demo run, a test. Allocated once per context via [`ContextId::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

static CONTEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl ContextId {
    pub fn next() -> Self {
        Self(CONTEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Typed topics, one per entity kind held in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreTopic {
    LeaveApplications,
    Notifications(Role),
    AttendanceControl,
}

/// Why a subscriber is being woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// A context wrote to the topic and broadcast the change.
    Write,
    /// Periodic re-check for subscribers that may have missed a signal.
    Reconcile,
}

/// One event on the bus.
#[derive(Debug, Clone, Copy)]
pub struct StoreEvent {
    pub topic: StoreTopic,
    pub change: StoreChange,
    /// Writer identity; `None` for reconciliation ticks.
    pub origin: Option<ContextId>,
}

const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(1);

struct Watcher {
    subscribers: usize,
    ticker: JoinHandle<()>,
}

/// Broadcast hub for store mutations.
///
/// Shared as `Arc<ChangeBus>` across every service and context in the
/// process. Publishing never blocks; with zero subscribers the event is
/// dropped, matching the store's last-write-wins discipline.
pub struct ChangeBus {
    sender: broadcast::Sender<StoreEvent>,
    reconcile_interval: Duration,
    watchers: Mutex<HashMap<StoreTopic, Watcher>>,
}

impl ChangeBus {
    pub fn new() -> Arc<Self> {
        Self::with_reconcile_interval(DEFAULT_RECONCILE_INTERVAL)
    }

    /// Bus with a custom reconciliation cadence. Tests shrink the interval.
    pub fn with_reconcile_interval(interval: Duration) -> Arc<Self> {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Arc::new(Self {
            sender,
            reconcile_interval: interval,
            watchers: Mutex::new(HashMap::new()),
        })
    }

    /// Broadcast a write on `topic` performed by `origin`.
    pub fn publish(&self, topic: StoreTopic, origin: ContextId) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(StoreEvent {
            topic,
            change: StoreChange::Write,
            origin: Some(origin),
        });
    }

    /// Subscribe `context` to `topic`.
    ///
    /// The first subscriber for a topic starts its reconciliation ticker;
    /// later subscribers share it. Must be called from within a tokio
    /// runtime.
    pub fn subscribe(self: &Arc<Self>, topic: StoreTopic, context: ContextId) -> TopicSubscription {
        let receiver = self.sender.subscribe();

        let mut watchers = self.watchers.lock().expect("watcher mutex poisoned");
        let entry = watchers.entry(topic).or_insert_with(|| {
            let sender = self.sender.clone();
            let interval = self.reconcile_interval;
            let ticker = tokio::spawn(async move {
                let mut tick = tokio::time::interval(interval);
                tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                // The first tick fires immediately; skip it so subscribers
                // only see genuine periodic re-checks.
                tick.tick().await;
                loop {
                    tick.tick().await;
                    let _ = sender.send(StoreEvent {
                        topic,
                        change: StoreChange::Reconcile,
                        origin: None,
                    });
                }
            });
            Watcher {
                subscribers: 0,
                ticker,
            }
        });
        entry.subscribers += 1;

        TopicSubscription {
            topic,
            context,
            receiver,
            bus: Arc::clone(self),
        }
    }

    fn unsubscribe(&self, topic: StoreTopic) {
        let mut watchers = self.watchers.lock().expect("watcher mutex poisoned");
        if let Some(entry) = watchers.get_mut(&topic) {
            entry.subscribers -= 1;
            if entry.subscribers == 0 {
                entry.ticker.abort();
                watchers.remove(&topic);
            }
        }
    }

    #[cfg(test)]
    fn watcher_count(&self) -> usize {
        self.watchers.lock().expect("watcher mutex poisoned").len()
    }
}

/// A context's live view onto one topic.
///
/// Dropping the subscription releases its share of the topic's
/// reconciliation ticker.
pub struct TopicSubscription {
    topic: StoreTopic,
    context: ContextId,
    receiver: broadcast::Receiver<StoreEvent>,
    bus: Arc<ChangeBus>,
}

impl TopicSubscription {
    /// Wait for the next change on the subscribed topic.
    ///
    /// Events for other topics and this context's own writes are skipped, so
    /// a handler never observes its own echo. Returns `None` once the bus is
    /// gone. A lagged receiver reports a [`StoreChange::Reconcile`] so the
    /// caller re-reads the store instead of trusting a gapless stream.
    pub async fn changed(&mut self) -> Option<StoreChange> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.topic != self.topic {
                        continue;
                    }
                    if event.origin == Some(self.context) {
                        continue;
                    }
                    return Some(event.change);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    return Some(StoreChange::Reconcile);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for TopicSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.topic);
    }
}
