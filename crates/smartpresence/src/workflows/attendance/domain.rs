use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Capture method a teacher can arm for a class session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Qr,
    Face,
}

impl CaptureMode {
    pub const fn label(self) -> &'static str {
        match self {
            CaptureMode::Qr => "qr",
            CaptureMode::Face => "face",
        }
    }
}

/// Global class-mode switch owned by the admin dashboard.
///
/// Offline mode requires the location check before any capture; online mode
/// skips it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassMode {
    Online,
    Offline,
}

impl ClassMode {
    pub const fn label(self) -> &'static str {
        match self {
            ClassMode::Online => "online",
            ClassMode::Offline => "offline",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown class mode '{0}', expected 'online' or 'offline'")]
pub struct UnknownClassMode(pub String);

impl FromStr for ClassMode {
    type Err = UnknownClassMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(ClassMode::Online),
            "offline" => Ok(ClassMode::Offline),
            other => Err(UnknownClassMode(other.to_string())),
        }
    }
}

/// A teacher-armed window in which one capture method is authorized for the
/// students of a class. A new activation supersedes the prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub mode: CaptureMode,
    pub subject: String,
    pub class_id: String,
    pub window_start: DateTime<Utc>,
    pub issued_by: String,
    pub active: bool,
}

impl AttendanceSession {
    /// Identity of this session for idempotency markers.
    pub fn scope_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.issued_by,
            self.class_id,
            self.window_start.timestamp_millis()
        )
    }
}

/// Returned once a marking attempt resolves successfully.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkingReceipt {
    pub user_id: String,
    pub session: String,
    pub subject: String,
    pub mode: CaptureMode,
    pub marked_at: DateTime<Utc>,
    /// Decoded QR payload when the capture method was a scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}
