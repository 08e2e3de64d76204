use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    LeaveApplication, LeaveId, LeaveStatus, LeaveSubmission, LeaveType, MAX_ATTACHMENT_BYTES,
};
use super::repository::{LeaveRepository, RepositoryError};
use crate::store::{ChangeBus, ContextId, StoreTopic, TopicSubscription};
use crate::workflows::notifications::{NotificationHub, NotificationKind};
use crate::workflows::roles::Role;

static LEAVE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_leave_id() -> (u64, LeaveId) {
    let seq = LEAVE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (seq, LeaveId(format!("leave-{seq:06}")))
}

/// Role-prefixed, time-derived application number.
///
/// The millisecond suffix alone can collide inside one tick, so the
/// process-scoped sequence is appended to keep numbers unique for the
/// lifetime of the store instance.
fn application_number(role: Role, seq: u64) -> String {
    let prefix = match role {
        Role::Teacher => "TL",
        Role::Student => "SL",
    };
    let suffix = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    format!("{prefix}{suffix:06}-{seq:04}")
}

/// Service composing validation, the partitioned store, and notification
/// fan-out for the leave workflow.
pub struct LeaveService<R> {
    repository: Arc<R>,
    hub: Arc<NotificationHub>,
    bus: Arc<ChangeBus>,
    context: ContextId,
}

impl<R> LeaveService<R>
where
    R: LeaveRepository + 'static,
{
    /// Build a service for one dashboard context over the shared store.
    pub fn new(repository: Arc<R>, hub: Arc<NotificationHub>, bus: Arc<ChangeBus>) -> Self {
        Self {
            repository,
            hub,
            bus,
            context: ContextId::next(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Watch the leave topic; this context's own writes are filtered out.
    pub fn subscribe(&self) -> TopicSubscription {
        self.bus.subscribe(StoreTopic::LeaveApplications, self.context)
    }

    /// Validate and store a new application with status `Pending`.
    pub fn submit(
        &self,
        submission: LeaveSubmission,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        validate_submission(&submission)?;

        let role = submission.submitted_by.role;
        let (seq, id) = next_leave_id();
        let application = LeaveApplication {
            id,
            leave_type: submission.leave_type,
            subject: submission.subject,
            content: submission.content,
            start_date: submission.start_date,
            end_date: submission.end_date,
            status: LeaveStatus::Pending,
            application_number: application_number(role, seq),
            submitted_at: Utc::now(),
            updated_at: None,
            submitted_by: submission.submitted_by,
            rejection_reason: None,
            attachment: submission.attachment,
        };

        let stored = self.repository.insert(application)?;
        tracing::info!(
            application = %stored.application_number,
            role = role.label(),
            "leave application submitted"
        );
        self.bus.publish(StoreTopic::LeaveApplications, self.context);
        self.hub.notify(
            self.context,
            role,
            "Leave application submitted",
            format!(
                "Leave application \"{}\" was submitted as #{}.",
                stored.subject, stored.application_number
            ),
            NotificationKind::LeaveUpdate,
        );
        Ok(stored)
    }

    /// Transition a pending application to `Approved` and notify the
    /// submitter's role inbox.
    pub fn approve(&self, id: &LeaveId) -> Result<LeaveApplication, LeaveServiceError> {
        let application = self.transition(id, LeaveStatus::Approved, None)?;
        self.hub.notify(
            self.context,
            application.submitted_by.role,
            "Leave application approved",
            format!(
                "Your leave application \"{}\" has been approved.",
                application.subject
            ),
            NotificationKind::Success,
        );
        Ok(application)
    }

    /// Transition a pending application to `Rejected` with a reason.
    ///
    /// A blank reason is refused and the application stays pending.
    pub fn reject(
        &self,
        id: &LeaveId,
        reason: &str,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LeaveValidationError::EmptyRejectionReason.into());
        }

        let application = self.transition(id, LeaveStatus::Rejected, Some(reason.to_string()))?;
        self.hub.notify(
            self.context,
            application.submitted_by.role,
            "Leave application rejected",
            format!(
                "Your leave application \"{}\" was rejected. Reason: {reason}",
                application.subject
            ),
            NotificationKind::Error,
        );
        Ok(application)
    }

    /// Global cross-role index.
    pub fn applications(&self) -> Result<Vec<LeaveApplication>, LeaveServiceError> {
        Ok(self.repository.all()?)
    }

    /// The submitter list for one role.
    pub fn for_role(&self, role: Role) -> Result<Vec<LeaveApplication>, LeaveServiceError> {
        Ok(self.repository.for_role(role)?)
    }

    pub fn get(&self, id: &LeaveId) -> Result<LeaveApplication, LeaveServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(LeaveServiceError::Repository(RepositoryError::NotFound))
    }

    fn transition(
        &self,
        id: &LeaveId,
        status: LeaveStatus,
        rejection_reason: Option<String>,
    ) -> Result<LeaveApplication, LeaveServiceError> {
        let mut application = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        if application.status != LeaveStatus::Pending {
            return Err(LeaveServiceError::Conflict {
                id: id.clone(),
                status: application.status,
            });
        }

        application.status = status;
        application.rejection_reason = rejection_reason;
        application.updated_at = Some(Utc::now());

        self.repository.update(application.clone())?;
        tracing::info!(
            application = %application.application_number,
            status = status.label(),
            "leave application resolved"
        );
        self.bus.publish(StoreTopic::LeaveApplications, self.context);
        Ok(application)
    }
}

fn validate_submission(submission: &LeaveSubmission) -> Result<(), LeaveValidationError> {
    let role = submission.submitted_by.role;
    if !submission.leave_type.available_to(role) {
        return Err(LeaveValidationError::LeaveTypeNotAllowed {
            leave_type: submission.leave_type,
            role,
        });
    }

    if submission.subject.trim().is_empty() {
        return Err(LeaveValidationError::EmptySubject);
    }
    if submission.content.trim().is_empty() {
        return Err(LeaveValidationError::EmptyContent);
    }

    if submission.end_date < submission.start_date {
        return Err(LeaveValidationError::InvalidDateRange {
            start: submission.start_date,
            end: submission.end_date,
        });
    }

    if let Some(attachment) = &submission.attachment {
        if attachment.size_bytes > MAX_ATTACHMENT_BYTES {
            return Err(LeaveValidationError::AttachmentTooLarge {
                size_bytes: attachment.size_bytes,
            });
        }

        let media_type: mime::Mime = attachment
            .media_type
            .parse()
            .map_err(|_| LeaveValidationError::InvalidMediaType {
                value: attachment.media_type.clone(),
            })?;
        let allowed =
            media_type.type_() == mime::IMAGE || media_type.essence_str() == "application/pdf";
        if !allowed {
            return Err(LeaveValidationError::UnsupportedAttachment {
                media_type: attachment.media_type.clone(),
            });
        }
    }

    Ok(())
}

/// Validation errors raised before any mutation is applied.
#[derive(Debug, thiserror::Error)]
pub enum LeaveValidationError {
    #[error("leave type '{}' is not in the {} catalog", leave_type.label(), role.label())]
    LeaveTypeNotAllowed { leave_type: LeaveType, role: Role },
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("content must not be empty")]
    EmptyContent,
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("attachment is {size_bytes} bytes, above the {MAX_ATTACHMENT_BYTES} byte cap")]
    AttachmentTooLarge { size_bytes: u64 },
    #[error("attachment media type '{value}' is not a valid media type")]
    InvalidMediaType { value: String },
    #[error("attachment media type '{media_type}' is not an image or PDF")]
    UnsupportedAttachment { media_type: String },
    #[error("rejection reason must not be empty")]
    EmptyRejectionReason,
}

/// Error raised by the leave service.
#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error(transparent)]
    Validation(#[from] LeaveValidationError),
    #[error("leave application {} is already {}", id.0, status.label())]
    Conflict { id: LeaveId, status: LeaveStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
