use std::collections::HashSet;

use super::common::*;
use crate::workflows::leave::domain::{LeaveStatus, LeaveType};
use crate::workflows::leave::repository::LeaveRepository;
use crate::workflows::leave::service::{LeaveServiceError, LeaveValidationError};
use crate::workflows::notifications::NotificationKind;
use crate::workflows::roles::Role;

#[test]
fn submit_stores_pending_application_with_number() {
    let (service, repository, _) = build_service();

    let stored = service
        .submit(student_submission())
        .expect("submission succeeds");

    assert_eq!(stored.status, LeaveStatus::Pending);
    assert!(stored.application_number.starts_with("SL"));
    assert_eq!(stored.duration_days(), 3);
    assert!(stored.rejection_reason.is_none());

    let fetched = repository
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(fetched, stored);
}

#[test]
fn teacher_numbers_use_teacher_prefix() {
    let (service, _, _) = build_service();
    let stored = service
        .submit(teacher_submission())
        .expect("submission succeeds");
    assert!(stored.application_number.starts_with("TL"));
}

#[test]
fn application_numbers_are_unique() {
    let (service, _, _) = build_service();
    let mut seen = HashSet::new();
    for _ in 0..50 {
        let stored = service
            .submit(student_submission())
            .expect("submission succeeds");
        assert!(
            seen.insert(stored.application_number.clone()),
            "duplicate application number {}",
            stored.application_number
        );
    }
}

#[test]
fn submit_rejects_type_outside_role_catalog() {
    let (service, _, _) = build_service();
    let mut submission = student_submission();
    submission.leave_type = LeaveType::Casual;

    match service.submit(submission) {
        Err(LeaveServiceError::Validation(LeaveValidationError::LeaveTypeNotAllowed {
            role: Role::Student,
            ..
        })) => {}
        other => panic!("expected catalog violation, got {other:?}"),
    }
}

#[test]
fn submit_rejects_reversed_date_range() {
    let (service, _, _) = build_service();
    let mut submission = student_submission();
    std::mem::swap(&mut submission.start_date, &mut submission.end_date);

    assert!(matches!(
        service.submit(submission),
        Err(LeaveServiceError::Validation(
            LeaveValidationError::InvalidDateRange { .. }
        ))
    ));
}

#[test]
fn submit_rejects_blank_subject_and_content() {
    let (service, _, _) = build_service();

    let mut submission = student_submission();
    submission.subject = "   ".to_string();
    assert!(matches!(
        service.submit(submission),
        Err(LeaveServiceError::Validation(
            LeaveValidationError::EmptySubject
        ))
    ));

    let mut submission = student_submission();
    submission.content = String::new();
    assert!(matches!(
        service.submit(submission),
        Err(LeaveServiceError::Validation(
            LeaveValidationError::EmptyContent
        ))
    ));
}

#[test]
fn submit_enforces_attachment_limits() {
    let (service, _, _) = build_service();

    let mut submission = student_submission();
    submission.attachment = Some(pdf_attachment(6 * 1024 * 1024));
    assert!(matches!(
        service.submit(submission),
        Err(LeaveServiceError::Validation(
            LeaveValidationError::AttachmentTooLarge { .. }
        ))
    ));

    let mut submission = student_submission();
    let mut attachment = pdf_attachment(1024);
    attachment.media_type = "video/mp4".to_string();
    submission.attachment = Some(attachment);
    assert!(matches!(
        service.submit(submission),
        Err(LeaveServiceError::Validation(
            LeaveValidationError::UnsupportedAttachment { .. }
        ))
    ));

    let mut submission = student_submission();
    submission.attachment = Some(pdf_attachment(1024));
    assert!(service.submit(submission).is_ok());
}

#[test]
fn approve_is_terminal() {
    let (service, repository, _) = build_service();
    let stored = service
        .submit(student_submission())
        .expect("submission succeeds");

    let approved = service.approve(&stored.id).expect("approval succeeds");
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert!(approved.updated_at.is_some());

    match service.approve(&stored.id) {
        Err(LeaveServiceError::Conflict { status, .. }) => {
            assert_eq!(status, LeaveStatus::Approved);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // A reject after approval must not touch the record either.
    assert!(matches!(
        service.reject(&stored.id, "late"),
        Err(LeaveServiceError::Conflict { .. })
    ));
    let unchanged = repository
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(unchanged.status, LeaveStatus::Approved);
    assert!(unchanged.rejection_reason.is_none());
}

#[test]
fn reject_requires_a_reason() {
    let (service, repository, _) = build_service();
    let stored = service
        .submit(student_submission())
        .expect("submission succeeds");

    assert!(matches!(
        service.reject(&stored.id, "   "),
        Err(LeaveServiceError::Validation(
            LeaveValidationError::EmptyRejectionReason
        ))
    ));

    let unchanged = repository
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(unchanged.status, LeaveStatus::Pending);
}

#[test]
fn reject_sets_reason_and_notifies_submitter_role() {
    let (service, _, hub) = build_service();
    let stored = service
        .submit(student_submission())
        .expect("submission succeeds");

    let rejected = service
        .reject(&stored.id, "insufficient notice")
        .expect("rejection succeeds");
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("insufficient notice")
    );

    let inbox = hub.notifications(Role::Student);
    assert_eq!(inbox[0].kind, NotificationKind::Error);
    assert!(inbox[0].message.contains("insufficient notice"));
    assert!(inbox[0].is_new);
}

#[test]
fn both_views_observe_the_transition_together() {
    let (service, repository, _) = build_service();
    let stored = service
        .submit(student_submission())
        .expect("submission succeeds");
    service.approve(&stored.id).expect("approval succeeds");

    let global = repository.all().expect("index readable");
    let students = repository.for_role(Role::Student).expect("view readable");

    let in_global = global
        .iter()
        .find(|app| app.id == stored.id)
        .expect("present in index");
    let in_view = students
        .iter()
        .find(|app| app.id == stored.id)
        .expect("present in role view");
    assert_eq!(in_global.status, LeaveStatus::Approved);
    assert_eq!(in_view.status, LeaveStatus::Approved);
}
