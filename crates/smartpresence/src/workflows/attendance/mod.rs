//! Attendance gating: geofence evaluation, capability sessions, the QR
//! decode loop, and the controller deciding whether a user may be marked
//! present for the armed session.

pub mod capture;
pub mod control;
pub mod domain;
pub mod geofence;
pub mod qr;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use capture::{
    CameraConstraints, CameraFacing, CameraFeed, CameraSource, Capability, CapabilityError,
    FaceCapture, Frame, FrameSender, LocationRequest, LocationSource,
};
pub use control::AttendanceControl;
pub use domain::{AttendanceSession, CaptureMode, ClassMode, MarkingReceipt};
pub use geofence::{haversine_distance_meters, within_radius, GeoCoordinate};
pub use qr::{QrDetector, QrScanResult, QrScanner, DEFAULT_SCAN_TIMEOUT, NO_CODE_FOUND};
pub use router::attendance_router;
pub use service::{AttendanceError, AttendanceService, GeofencePolicy};
