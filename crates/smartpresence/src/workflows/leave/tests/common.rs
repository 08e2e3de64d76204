use std::sync::Arc;

use chrono::NaiveDate;
use tokio::time::Duration;

use crate::store::ChangeBus;
use crate::workflows::leave::domain::{
    AttachmentMetadata, LeaveSubmission, LeaveType, SubmitterProfile,
};
use crate::workflows::leave::repository::InMemoryLeaveStore;
use crate::workflows::leave::router::leave_router;
use crate::workflows::leave::service::LeaveService;
use crate::workflows::notifications::NotificationHub;
use crate::workflows::roles::Role;

pub(super) fn student_profile() -> SubmitterProfile {
    SubmitterProfile {
        id: "student-25".to_string(),
        name: "Sneha Kumari".to_string(),
        role: Role::Student,
        email: "sneha@school.example".to_string(),
        class: Some("10".to_string()),
        roll_number: Some("25".to_string()),
        subjects: Vec::new(),
    }
}

pub(super) fn teacher_profile() -> SubmitterProfile {
    SubmitterProfile {
        id: "teacher-1".to_string(),
        name: "R. Verma".to_string(),
        role: Role::Teacher,
        email: "verma@school.example".to_string(),
        class: None,
        roll_number: None,
        subjects: vec!["Mathematics".to_string(), "Physics".to_string()],
    }
}

pub(super) fn student_submission() -> LeaveSubmission {
    LeaveSubmission {
        leave_type: LeaveType::FamilyFunction,
        subject: "Cousin's wedding".to_string(),
        content: "Travelling out of town for a family wedding.".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 12).expect("valid date"),
        submitted_by: student_profile(),
        attachment: None,
    }
}

pub(super) fn teacher_submission() -> LeaveSubmission {
    LeaveSubmission {
        leave_type: LeaveType::Casual,
        subject: "Personal errand".to_string(),
        content: "Half day needed for documentation work.".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date"),
        submitted_by: teacher_profile(),
        attachment: None,
    }
}

pub(super) fn pdf_attachment(size_bytes: u64) -> AttachmentMetadata {
    AttachmentMetadata {
        file_name: "medical-certificate.pdf".to_string(),
        media_type: "application/pdf".to_string(),
        size_bytes,
    }
}

pub(super) fn build_service() -> (
    LeaveService<InMemoryLeaveStore>,
    Arc<InMemoryLeaveStore>,
    Arc<NotificationHub>,
) {
    let bus = ChangeBus::with_reconcile_interval(Duration::from_secs(600));
    let repository = Arc::new(InMemoryLeaveStore::new());
    let hub = Arc::new(NotificationHub::new(bus.clone()));
    let service = LeaveService::new(repository.clone(), hub.clone(), bus);
    (service, repository, hub)
}

pub(super) fn build_router() -> axum::Router {
    let (service, _, _) = build_service();
    leave_router(Arc::new(service))
}
