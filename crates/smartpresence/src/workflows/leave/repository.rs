use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{LeaveApplication, LeaveId};
use crate::workflows::roles::Role;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations must keep the global index and the per-role submitter
/// lists consistent with each other: a reader must never observe a
/// transition applied to one view and not the other.
pub trait LeaveRepository: Send + Sync {
    fn insert(&self, application: LeaveApplication)
        -> Result<LeaveApplication, RepositoryError>;
    fn update(&self, application: LeaveApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &LeaveId) -> Result<Option<LeaveApplication>, RepositoryError>;
    fn all(&self) -> Result<Vec<LeaveApplication>, RepositoryError>;
    fn for_role(&self, role: Role) -> Result<Vec<LeaveApplication>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default)]
struct LeaveViews {
    /// Global cross-role index, insertion order.
    index: Vec<LeaveApplication>,
    /// Per-role submitter lists, insertion order.
    by_role: HashMap<Role, Vec<LeaveApplication>>,
}

/// Shared-store backed repository.
///
/// Both views live behind one mutex, so a transition lands in the global
/// index and the submitter's role list in the same critical section. There
/// is no cross-key transaction beyond that; the store discipline stays
/// last-write-wins.
#[derive(Default)]
pub struct InMemoryLeaveStore {
    views: Mutex<LeaveViews>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaveRepository for InMemoryLeaveStore {
    fn insert(
        &self,
        application: LeaveApplication,
    ) -> Result<LeaveApplication, RepositoryError> {
        let mut views = self.views.lock().expect("leave store mutex poisoned");
        if views.index.iter().any(|app| app.id == application.id) {
            return Err(RepositoryError::Conflict);
        }

        views.index.push(application.clone());
        views
            .by_role
            .entry(application.submitted_by.role)
            .or_default()
            .push(application.clone());
        Ok(application)
    }

    fn update(&self, application: LeaveApplication) -> Result<(), RepositoryError> {
        let mut views = self.views.lock().expect("leave store mutex poisoned");

        let slot = views
            .index
            .iter_mut()
            .find(|app| app.id == application.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = application.clone();

        if let Some(list) = views.by_role.get_mut(&application.submitted_by.role) {
            if let Some(slot) = list.iter_mut().find(|app| app.id == application.id) {
                *slot = application;
            }
        }
        Ok(())
    }

    fn fetch(&self, id: &LeaveId) -> Result<Option<LeaveApplication>, RepositoryError> {
        let views = self.views.lock().expect("leave store mutex poisoned");
        Ok(views.index.iter().find(|app| &app.id == id).cloned())
    }

    fn all(&self) -> Result<Vec<LeaveApplication>, RepositoryError> {
        let views = self.views.lock().expect("leave store mutex poisoned");
        Ok(views.index.clone())
    }

    fn for_role(&self, role: Role) -> Result<Vec<LeaveApplication>, RepositoryError> {
        let views = self.views.lock().expect("leave store mutex poisoned");
        Ok(views.by_role.get(&role).cloned().unwrap_or_default())
    }
}
