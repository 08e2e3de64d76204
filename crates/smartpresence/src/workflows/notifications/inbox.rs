use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::domain::{Notification, NotificationId, NotificationKind, INBOX_CAP, TRIMMED_LEN};
use crate::store::{ChangeBus, ContextId, StoreTopic};
use crate::workflows::roles::Role;

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// Fan-out engine over the per-role inboxes.
///
/// Each mutation broadcasts on the role's [`StoreTopic::Notifications`]
/// topic; other contexts also re-read on the bus's periodic reconcile tick,
/// so a missed signal only delays visibility by about a second.
pub struct NotificationHub {
    inboxes: Mutex<HashMap<Role, Vec<Notification>>>,
    bus: Arc<ChangeBus>,
}

impl NotificationHub {
    pub fn new(bus: Arc<ChangeBus>) -> Self {
        Self {
            inboxes: Mutex::new(HashMap::new()),
            bus,
        }
    }

    /// Append a notification to `role`'s inbox, newest first.
    ///
    /// The new entry carries `is_new = true`; existing entries keep their
    /// flag untouched — clearing is [`NotificationHub::mark_as_read`]'s job.
    /// Insertion beyond [`INBOX_CAP`] evicts the oldest entries.
    pub fn notify(
        &self,
        origin: ContextId,
        role: Role,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Notification {
        let notification = Notification {
            id: next_notification_id(),
            title: title.into(),
            message: message.into(),
            kind,
            timestamp: Utc::now(),
            is_new: true,
            recipient: role,
        };

        {
            let mut inboxes = self.inboxes.lock().expect("inbox mutex poisoned");
            let inbox = inboxes.entry(role).or_default();
            inbox.insert(0, notification.clone());
            inbox.truncate(INBOX_CAP);
        }

        tracing::debug!(role = role.label(), kind = kind.label(), "notification fanned out");
        self.bus.publish(StoreTopic::Notifications(role), origin);
        notification
    }

    /// Snapshot of `role`'s inbox, newest first.
    pub fn notifications(&self, role: Role) -> Vec<Notification> {
        let inboxes = self.inboxes.lock().expect("inbox mutex poisoned");
        inboxes.get(&role).cloned().unwrap_or_default()
    }

    /// Clear `is_new` on every entry of `role`'s inbox atomically.
    pub fn mark_as_read(&self, origin: ContextId, role: Role) {
        {
            let mut inboxes = self.inboxes.lock().expect("inbox mutex poisoned");
            if let Some(inbox) = inboxes.get_mut(&role) {
                for entry in inbox.iter_mut() {
                    entry.is_new = false;
                }
            }
        }
        self.bus.publish(StoreTopic::Notifications(role), origin);
    }

    /// Trim `role`'s inbox down to the latest [`TRIMMED_LEN`] entries.
    pub fn clear_old(&self, origin: ContextId, role: Role) {
        {
            let mut inboxes = self.inboxes.lock().expect("inbox mutex poisoned");
            if let Some(inbox) = inboxes.get_mut(&role) {
                inbox.truncate(TRIMMED_LEN);
            }
        }
        self.bus.publish(StoreTopic::Notifications(role), origin);
    }
}
