use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::time::Duration;

use smartpresence::config::AppConfig;
use smartpresence::store::ChangeBus;
use smartpresence::workflows::attendance::{
    AttendanceControl, AttendanceService, CameraConstraints, CameraFeed, CameraSource,
    CapabilityError, FaceCapture, Frame, GeoCoordinate, GeofencePolicy, LocationRequest,
    LocationSource, QrDetector, QrScanner,
};
use smartpresence::workflows::leave::{InMemoryLeaveStore, LeaveService};
use smartpresence::workflows::notifications::NotificationHub;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Simulated camera binding: emits a handful of empty frames, then one frame
/// whose bytes carry a decodable attendance payload. Stands in for real
/// hardware the same way the original prototype's simulated detection did.
pub(crate) struct SimulatedCamera;

const FRAMES_BEFORE_CODE: usize = 4;

#[async_trait]
impl CameraSource for SimulatedCamera {
    async fn acquire(
        &self,
        constraints: CameraConstraints,
    ) -> Result<CameraFeed, CapabilityError> {
        let (sender, feed) = CameraFeed::channel(8);
        let (width, height) = (constraints.width, constraints.height);
        tokio::spawn(async move {
            for n in 0.. {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let luma = if n < FRAMES_BEFORE_CODE {
                    Vec::new()
                } else {
                    format!("ATTENDANCE-{}", Utc::now().timestamp_millis()).into_bytes()
                };
                if !sender.offer(Frame {
                    width,
                    height,
                    luma,
                }) {
                    return;
                }
            }
        });
        Ok(feed)
    }
}

/// Simulated geolocation binding answering from a fixed coordinate.
pub(crate) struct SimulatedLocation {
    coordinate: GeoCoordinate,
}

impl SimulatedLocation {
    pub(crate) fn at(coordinate: GeoCoordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationSource for SimulatedLocation {
    async fn current_location(
        &self,
        _request: &LocationRequest,
    ) -> Result<GeoCoordinate, CapabilityError> {
        Ok(self.coordinate)
    }
}

/// Treats a frame's bytes as the decoded payload when they carry the
/// simulated attendance marker.
pub(crate) struct PayloadDetector;

impl QrDetector for PayloadDetector {
    fn detect(&self, frame: &Frame) -> Option<String> {
        let text = std::str::from_utf8(&frame.luma).ok()?;
        text.starts_with("ATTENDANCE").then(|| text.to_string())
    }
}

pub(crate) type SimulatedAttendanceService =
    AttendanceService<SimulatedCamera, SimulatedLocation, PayloadDetector>;

/// Everything the serve and demo paths share: one store, one bus, and the
/// workflow services bound to simulated capability sources.
pub(crate) struct Services {
    pub(crate) hub: Arc<NotificationHub>,
    pub(crate) leave: Arc<LeaveService<InMemoryLeaveStore>>,
    pub(crate) attendance: Arc<SimulatedAttendanceService>,
}

pub(crate) fn build_services(config: &AppConfig) -> Services {
    let bus = ChangeBus::new();
    let repository = Arc::new(InMemoryLeaveStore::new());
    let hub = Arc::new(NotificationHub::new(bus.clone()));
    let leave = Arc::new(LeaveService::new(repository, hub.clone(), bus.clone()));

    let control = Arc::new(AttendanceControl::new(bus));
    let geofence = GeofencePolicy::from(&config.campus);
    let location = SimulatedLocation::at(geofence.reference);
    let attendance = Arc::new(
        AttendanceService::new(
            Arc::new(SimulatedCamera),
            Arc::new(location),
            QrScanner::with_timeout(PayloadDetector, config.capture.scan_timeout),
            FaceCapture::new(config.capture.face_settle),
            control,
            geofence,
        )
        .with_location_request(LocationRequest {
            high_accuracy: true,
            timeout: config.capture.location_timeout,
            max_age: config.capture.location_max_age,
        }),
    );

    Services {
        hub,
        leave,
        attendance,
    }
}
