//! Role-scoped notification inboxes and the fan-out engine feeding them.

pub mod domain;
pub mod inbox;
pub mod router;

pub use domain::{Notification, NotificationId, NotificationKind, INBOX_CAP};
pub use inbox::NotificationHub;
pub use router::notification_router;
