use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::domain::{AttendanceSession, ClassMode};
use crate::store::{ChangeBus, ContextId, StoreTopic, TopicSubscription};

struct ControlState {
    class_mode: ClassMode,
    session: Option<AttendanceSession>,
    /// Idempotency markers: (user id, session scope key).
    marked: HashSet<(String, String)>,
}

/// Shared attendance control state polled by every dashboard context: the
/// global class-mode flag, the active session record, and the per-session
/// idempotency markers. Mutations broadcast on the attendance topic.
pub struct AttendanceControl {
    state: Mutex<ControlState>,
    bus: Arc<ChangeBus>,
}

impl AttendanceControl {
    pub fn new(bus: Arc<ChangeBus>) -> Self {
        Self {
            state: Mutex::new(ControlState {
                class_mode: ClassMode::Offline,
                session: None,
                marked: HashSet::new(),
            }),
            bus,
        }
    }

    /// Watch the attendance topic as `context`.
    pub fn subscribe(&self, context: ContextId) -> TopicSubscription {
        self.bus.subscribe(StoreTopic::AttendanceControl, context)
    }

    pub fn class_mode(&self) -> ClassMode {
        self.state.lock().expect("control mutex poisoned").class_mode
    }

    /// Flip the global mode switch. Admin-owned; applies to every context.
    pub fn set_class_mode(&self, origin: ContextId, mode: ClassMode) {
        {
            let mut state = self.state.lock().expect("control mutex poisoned");
            state.class_mode = mode;
        }
        tracing::info!(mode = mode.label(), "class mode switched");
        self.bus.publish(StoreTopic::AttendanceControl, origin);
    }

    /// Arm a capture session, superseding whatever was armed before.
    pub fn arm_session(&self, origin: ContextId, session: AttendanceSession) {
        {
            let mut state = self.state.lock().expect("control mutex poisoned");
            state.session = Some(session.clone());
        }
        tracing::info!(
            mode = session.mode.label(),
            subject = %session.subject,
            teacher = %session.issued_by,
            "attendance session armed"
        );
        self.bus.publish(StoreTopic::AttendanceControl, origin);
    }

    /// Deactivate the current session if `teacher_id` armed it.
    ///
    /// Returns the disarmed session, or `None` when nothing was armed or the
    /// caller does not own it.
    pub fn disarm_session(
        &self,
        origin: ContextId,
        teacher_id: &str,
    ) -> Option<AttendanceSession> {
        let disarmed = {
            let mut state = self.state.lock().expect("control mutex poisoned");
            match &mut state.session {
                Some(session) if session.issued_by == teacher_id && session.active => {
                    session.active = false;
                    Some(session.clone())
                }
                _ => None,
            }
        };

        if let Some(session) = &disarmed {
            tracing::info!(teacher = %session.issued_by, "attendance session disarmed");
            self.bus.publish(StoreTopic::AttendanceControl, origin);
        }
        disarmed
    }

    /// The currently armed session, if any is active.
    pub fn active_session(&self) -> Option<AttendanceSession> {
        let state = self.state.lock().expect("control mutex poisoned");
        state.session.clone().filter(|session| session.active)
    }

    /// Whether `user_id` already holds a marker for `session`.
    pub fn is_marked(&self, user_id: &str, session: &AttendanceSession) -> bool {
        let state = self.state.lock().expect("control mutex poisoned");
        state
            .marked
            .contains(&(user_id.to_string(), session.scope_key()))
    }

    /// Record the idempotency marker after a genuinely successful capture.
    pub fn mark(&self, origin: ContextId, user_id: &str, session: &AttendanceSession) {
        {
            let mut state = self.state.lock().expect("control mutex poisoned");
            state
                .marked
                .insert((user_id.to_string(), session.scope_key()));
        }
        self.bus.publish(StoreTopic::AttendanceControl, origin);
    }
}
