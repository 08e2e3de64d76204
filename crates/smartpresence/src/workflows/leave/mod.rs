//! Leave application intake and the pending → approved|rejected state
//! machine, with views partitioned per submitting role.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AttachmentMetadata, LeaveApplication, LeaveId, LeaveStatus, LeaveSubmission, LeaveType,
    SubmitterProfile, MAX_ATTACHMENT_BYTES,
};
pub use repository::{InMemoryLeaveStore, LeaveRepository, RepositoryError};
pub use router::leave_router;
pub use service::{LeaveService, LeaveServiceError, LeaveValidationError};
