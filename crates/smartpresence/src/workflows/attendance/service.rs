use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::capture::{
    read_location, CameraConstraints, CameraSource, CapabilityError, FaceCapture, LocationRequest,
    LocationSource,
};
use super::control::AttendanceControl;
use super::domain::{AttendanceSession, CaptureMode, ClassMode, MarkingReceipt};
use super::geofence::{haversine_distance_meters, GeoCoordinate};
use super::qr::{QrDetector, QrScanner, NO_CODE_FOUND};
use crate::config::CampusConfig;
use crate::store::{ContextId, TopicSubscription};

/// The fixed institutional reference point and allowed radius.
#[derive(Debug, Clone, Copy)]
pub struct GeofencePolicy {
    pub reference: GeoCoordinate,
    pub radius_meters: f64,
}

impl GeofencePolicy {
    pub fn new(reference: GeoCoordinate, radius_meters: f64) -> Self {
        Self {
            reference,
            radius_meters,
        }
    }
}

impl From<&CampusConfig> for GeofencePolicy {
    fn from(campus: &CampusConfig) -> Self {
        Self::new(
            GeoCoordinate::new(campus.latitude, campus.longitude),
            campus.radius_meters,
        )
    }
}

/// Errors produced by a marking attempt. All are surfaced to the user and
/// recoverable by retrying the action.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("attendance already marked for session {session}")]
    AlreadyMarked { session: String },
    #[error(
        "{} capture is not enabled for the current session",
        requested.label()
    )]
    MethodDisabled {
        requested: CaptureMode,
        armed: Option<CaptureMode>,
    },
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    #[error("location source returned invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error(
        "({:.6}, {:.6}) is {distance_meters:.0} m from campus ({:.6}, {:.6}), outside the {radius_meters:.0} m radius",
        subject.latitude,
        subject.longitude,
        reference.latitude,
        reference.longitude
    )]
    OutOfRange {
        subject: GeoCoordinate,
        reference: GeoCoordinate,
        distance_meters: f64,
        radius_meters: f64,
    },
    #[error("qr scan failed: {reason}")]
    ScanFailed { reason: String },
}

/// The gating controller.
///
/// A marking attempt walks Idle → LocationCheck (offline mode only) →
/// CaptureActive → Resolved. The idempotency marker is written only after a
/// capture genuinely succeeds, and no capability is acquired when the
/// attempt is refused up front.
pub struct AttendanceService<C, L, D> {
    camera: Arc<C>,
    location: Arc<L>,
    scanner: QrScanner<D>,
    face: FaceCapture,
    control: Arc<AttendanceControl>,
    geofence: GeofencePolicy,
    constraints: CameraConstraints,
    location_request: LocationRequest,
    context: ContextId,
}

impl<C, L, D> AttendanceService<C, L, D>
where
    C: CameraSource + 'static,
    L: LocationSource + 'static,
    D: QrDetector + 'static,
{
    pub fn new(
        camera: Arc<C>,
        location: Arc<L>,
        scanner: QrScanner<D>,
        face: FaceCapture,
        control: Arc<AttendanceControl>,
        geofence: GeofencePolicy,
    ) -> Self {
        Self {
            camera,
            location,
            scanner,
            face,
            control,
            geofence,
            constraints: CameraConstraints::default(),
            location_request: LocationRequest::default(),
            context: ContextId::next(),
        }
    }

    pub fn with_location_request(mut self, request: LocationRequest) -> Self {
        self.location_request = request;
        self
    }

    pub fn control(&self) -> &Arc<AttendanceControl> {
        &self.control
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Watch the attendance topic; this context's own writes are filtered.
    pub fn subscribe(&self) -> TopicSubscription {
        self.control.subscribe(self.context)
    }

    /// Flip the global class mode. Admin dashboards call this.
    pub fn set_class_mode(&self, mode: ClassMode) {
        self.control.set_class_mode(self.context, mode);
    }

    /// Arm a session for `teacher_id`, superseding any prior one.
    pub fn arm_session(
        &self,
        teacher_id: &str,
        mode: CaptureMode,
        subject: &str,
        class_id: &str,
    ) -> AttendanceSession {
        let session = AttendanceSession {
            mode,
            subject: subject.to_string(),
            class_id: class_id.to_string(),
            window_start: Utc::now(),
            issued_by: teacher_id.to_string(),
            active: true,
        };
        self.control.arm_session(self.context, session.clone());
        session
    }

    /// Deactivate the session `teacher_id` armed, if it is still active.
    pub fn disarm_session(&self, teacher_id: &str) -> Option<AttendanceSession> {
        self.control.disarm_session(self.context, teacher_id)
    }

    /// Run one marking attempt for `user_id` with the requested method.
    pub async fn mark_attendance(
        &self,
        user_id: &str,
        requested: CaptureMode,
    ) -> Result<MarkingReceipt, AttendanceError> {
        let Some(session) = self.control.active_session() else {
            return Err(AttendanceError::MethodDisabled {
                requested,
                armed: None,
            });
        };

        // Already-marked takes precedence over a disabled method, and both
        // refusals happen before any capability is touched.
        if self.control.is_marked(user_id, &session) {
            return Err(AttendanceError::AlreadyMarked {
                session: session.scope_key(),
            });
        }
        if session.mode != requested {
            return Err(AttendanceError::MethodDisabled {
                requested,
                armed: Some(session.mode),
            });
        }

        if self.control.class_mode() == ClassMode::Offline {
            tracing::debug!(user = user_id, "location check");
            self.verify_location().await?;
        }

        tracing::debug!(user = user_id, mode = session.mode.label(), "capture active");
        let payload = match session.mode {
            CaptureMode::Face => {
                let feed = self.camera.acquire(self.constraints).await?;
                self.face.capture(feed).await;
                None
            }
            CaptureMode::Qr => {
                let mut feed = self.camera.acquire(self.constraints).await?;
                let stop = CancellationToken::new();
                let result = self.scanner.scan(&mut feed, &stop).await;
                if !result.is_success() {
                    return Err(AttendanceError::ScanFailed {
                        reason: result
                            .error
                            .unwrap_or_else(|| NO_CODE_FOUND.to_string()),
                    });
                }
                result.data
            }
        };

        // The marker lands only after the capture genuinely succeeded.
        self.control.mark(self.context, user_id, &session);
        tracing::info!(
            user = user_id,
            subject = %session.subject,
            mode = session.mode.label(),
            "attendance marked"
        );

        Ok(MarkingReceipt {
            user_id: user_id.to_string(),
            session: session.scope_key(),
            subject: session.subject,
            mode: requested,
            marked_at: Utc::now(),
            payload,
        })
    }

    async fn verify_location(&self) -> Result<(), AttendanceError> {
        let subject = read_location(self.location.as_ref(), self.location_request).await?;
        if !subject.is_valid() {
            return Err(AttendanceError::InvalidCoordinates {
                latitude: subject.latitude,
                longitude: subject.longitude,
            });
        }

        let distance = haversine_distance_meters(self.geofence.reference, subject);
        if distance > self.geofence.radius_meters {
            return Err(AttendanceError::OutOfRange {
                subject,
                reference: self.geofence.reference,
                distance_meters: distance,
                radius_meters: self.geofence.radius_meters,
            });
        }
        Ok(())
    }
}
