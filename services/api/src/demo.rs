use chrono::{Local, NaiveDate};
use clap::Args;

use crate::infra::build_services;
use smartpresence::config::AppConfig;
use smartpresence::error::AppError;
use smartpresence::workflows::attendance::CaptureMode;
use smartpresence::workflows::leave::{LeaveSubmission, LeaveType, SubmitterProfile};
use smartpresence::workflows::roles::Role;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Leave start date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Leave end date (YYYY-MM-DD). Defaults to start date + 2 days.
    #[arg(long, value_parser = parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
    /// Rejection reason used by the admin step.
    #[arg(long, default_value = "insufficient notice")]
    pub(crate) reason: String,
    /// Skip the attendance marking portion of the demo.
    #[arg(long)]
    pub(crate) skip_attendance: bool,
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}': {err}"))
}

/// End-to-end CLI walkthrough against the in-process store and simulated
/// capability sources: submit → reject → inbox, then arm → scan → mark.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let services = build_services(&config);

    let start_date = args
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());
    let end_date = args
        .end_date
        .unwrap_or_else(|| start_date + chrono::Duration::days(2));

    println!("== leave workflow ==");
    let submitted = services.leave.submit(LeaveSubmission {
        leave_type: LeaveType::FamilyFunction,
        subject: "Family function".to_string(),
        content: "Requesting leave for a family function out of town.".to_string(),
        start_date,
        end_date,
        submitted_by: SubmitterProfile {
            id: "student-25".to_string(),
            name: "Sneha Kumari".to_string(),
            role: Role::Student,
            email: "sneha@school.example".to_string(),
            class: Some("10".to_string()),
            roll_number: Some("25".to_string()),
            subjects: Vec::new(),
        },
        attachment: None,
    })?;
    println!(
        "submitted #{} ({} days)",
        submitted.application_number,
        submitted.duration_days()
    );

    let rejected = services.leave.reject(&submitted.id, &args.reason)?;
    println!(
        "rejected #{}: {}",
        rejected.application_number,
        rejected.rejection_reason.as_deref().unwrap_or_default()
    );

    match services.leave.reject(&submitted.id, "second thoughts") {
        Err(err) => println!("second rejection refused: {err}"),
        Ok(_) => println!("unexpected: second rejection applied"),
    }

    println!("student inbox:");
    let inbox = services.hub.notifications(Role::Student);
    println!("{}", serde_json::to_string_pretty(&inbox).expect("serializable inbox"));

    if args.skip_attendance {
        return Ok(());
    }

    println!("== attendance workflow ==");
    let session = services
        .attendance
        .arm_session("teacher-1", CaptureMode::Qr, "Mathematics", "10-A");
    println!(
        "armed {} session for {} ({})",
        session.mode.label(),
        session.subject,
        session.class_id
    );

    let receipt = services
        .attendance
        .mark_attendance("student-25", CaptureMode::Qr)
        .await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&receipt).expect("serializable receipt")
    );

    match services
        .attendance
        .mark_attendance("student-25", CaptureMode::Qr)
        .await
    {
        Err(err) => println!("repeat marking refused: {err}"),
        Ok(_) => println!("unexpected: repeat marking accepted"),
    }

    Ok(())
}
