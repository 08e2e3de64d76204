use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::roles::Role;

/// Identifier wrapper for submitted leave applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveId(pub String);

/// Leave catalogs differ per role; the enum carries both and
/// [`LeaveType::available_to`] enforces the partition at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Sick,
    Casual,
    Earned,
    MaternityPaternity,
    Emergency,
    Medical,
    Personal,
    FamilyFunction,
    MedicalAppointment,
    EducationalTrip,
    SportsCompetition,
    PersonalReasons,
}

const TEACHER_CATALOG: &[LeaveType] = &[
    LeaveType::Sick,
    LeaveType::Casual,
    LeaveType::Earned,
    LeaveType::MaternityPaternity,
    LeaveType::Emergency,
    LeaveType::Medical,
    LeaveType::Personal,
];

const STUDENT_CATALOG: &[LeaveType] = &[
    LeaveType::Sick,
    LeaveType::FamilyFunction,
    LeaveType::MedicalAppointment,
    LeaveType::Emergency,
    LeaveType::EducationalTrip,
    LeaveType::SportsCompetition,
    LeaveType::PersonalReasons,
];

impl LeaveType {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveType::Sick => "Sick Leave",
            LeaveType::Casual => "Casual Leave",
            LeaveType::Earned => "Earned Leave",
            LeaveType::MaternityPaternity => "Maternity/Paternity Leave",
            LeaveType::Emergency => "Emergency Leave",
            LeaveType::Medical => "Medical Leave",
            LeaveType::Personal => "Personal Leave",
            LeaveType::FamilyFunction => "Family Function",
            LeaveType::MedicalAppointment => "Medical Appointment",
            LeaveType::EducationalTrip => "Educational Trip",
            LeaveType::SportsCompetition => "Sports Competition",
            LeaveType::PersonalReasons => "Personal Reasons",
        }
    }

    pub fn catalog(role: Role) -> &'static [LeaveType] {
        match role {
            Role::Teacher => TEACHER_CATALOG,
            Role::Student => STUDENT_CATALOG,
        }
    }

    pub fn available_to(self, role: Role) -> bool {
        Self::catalog(role).contains(&self)
    }
}

/// Lifecycle of a leave application; transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

/// Who submitted the application, with the fields their role carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterProfile {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
}

/// Attachment size ceiling (5 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Metadata for an uploaded supporting document. The blob itself lives with
/// the presentation layer; the core only validates and records its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    pub file_name: String,
    pub media_type: String,
    pub size_bytes: u64,
}

/// A stored leave application.
///
/// `rejection_reason` is present iff `status == Rejected`; `updated_at` is
/// set by the one permitted transition out of `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveApplication {
    pub id: LeaveId,
    pub leave_type: LeaveType,
    pub subject: String,
    pub content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub application_number: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub submitted_by: SubmitterProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentMetadata>,
}

impl LeaveApplication {
    /// Inclusive day count of the requested window.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Inbound submission payload, validated by the service before storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub leave_type: LeaveType,
    pub subject: String,
    pub content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub submitted_by: SubmitterProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentMetadata>,
}
