use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::roles::Role;

/// Identifier wrapper for inbox entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// Severity/category of an inbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    LeaveUpdate,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
            NotificationKind::LeaveUpdate => "leave_update",
        }
    }
}

/// One entry in a role's inbox. The inbox exclusively owns its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub is_new: bool,
    pub recipient: Role,
}

/// Inbox depth; insertion beyond the cap evicts the oldest entry.
pub const INBOX_CAP: usize = 5;

/// Entries kept by the explicit trim operation.
pub const TRIMMED_LEN: usize = 3;
