use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Duration;

use crate::store::ChangeBus;
use crate::workflows::attendance::capture::{
    CameraConstraints, CameraFeed, CameraSource, Capability, CapabilityError, FaceCapture, Frame,
    LocationRequest, LocationSource,
};
use crate::workflows::attendance::control::AttendanceControl;
use crate::workflows::attendance::geofence::GeoCoordinate;
use crate::workflows::attendance::qr::{QrDetector, QrScanner};
use crate::workflows::attendance::service::{AttendanceService, GeofencePolicy};

pub(super) const CAMPUS: GeoCoordinate = GeoCoordinate::new(25.637146, 85.012951);
pub(super) const NEARBY: GeoCoordinate = GeoCoordinate::new(25.641500, 85.012951);
pub(super) const DISTANT: GeoCoordinate = GeoCoordinate::new(25.650000, 85.012951);

pub(super) fn payload_frame(payload: &str) -> Frame {
    Frame {
        width: 640,
        height: 480,
        luma: payload.as_bytes().to_vec(),
    }
}

pub(super) fn blank_frame() -> Frame {
    Frame {
        width: 640,
        height: 480,
        luma: Vec::new(),
    }
}

/// Detects frames whose luma bytes spell a marker-prefixed payload.
pub(super) struct MarkerDetector;

impl QrDetector for MarkerDetector {
    fn detect(&self, frame: &Frame) -> Option<String> {
        let text = std::str::from_utf8(&frame.luma).ok()?;
        text.starts_with("ATT").then(|| text.to_string())
    }
}

enum CameraBehavior {
    Deny,
    Frames(Vec<Frame>),
}

/// Camera double replaying a scripted frame sequence, counting acquisitions.
pub(super) struct ScriptedCamera {
    behavior: CameraBehavior,
    frame_interval: Duration,
    acquisitions: AtomicUsize,
}

impl ScriptedCamera {
    pub(super) fn with_frames(frames: Vec<Frame>) -> Self {
        Self {
            behavior: CameraBehavior::Frames(frames),
            frame_interval: Duration::from_millis(50),
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// A camera that stays on but never has a frame ready.
    pub(super) fn idle() -> Self {
        Self::with_frames(Vec::new())
    }

    pub(super) fn denying() -> Self {
        Self {
            behavior: CameraBehavior::Deny,
            frame_interval: Duration::from_millis(50),
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub(super) fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CameraSource for ScriptedCamera {
    async fn acquire(
        &self,
        _constraints: CameraConstraints,
    ) -> Result<CameraFeed, CapabilityError> {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        let frames = match &self.behavior {
            CameraBehavior::Deny => {
                return Err(CapabilityError::Denied {
                    capability: Capability::Camera,
                })
            }
            CameraBehavior::Frames(frames) => frames.clone(),
        };

        let (sender, feed) = CameraFeed::channel(8);
        let interval = self.frame_interval;
        tokio::spawn(async move {
            for frame in frames {
                tokio::time::sleep(interval).await;
                if !sender.offer(frame) {
                    return;
                }
            }
            // Keep the device "on" until the consumer releases, so an
            // exhausted script reads as an idle feed rather than a closed one.
            sender.released().await;
        });
        Ok(feed)
    }
}

/// Location double answering from a fixed coordinate, counting reads.
pub(super) struct StaticLocation {
    coordinate: Option<GeoCoordinate>,
    requests: AtomicUsize,
}

impl StaticLocation {
    pub(super) fn at(coordinate: GeoCoordinate) -> Self {
        Self {
            coordinate: Some(coordinate),
            requests: AtomicUsize::new(0),
        }
    }

    pub(super) fn denying() -> Self {
        Self {
            coordinate: None,
            requests: AtomicUsize::new(0),
        }
    }

    pub(super) fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LocationSource for StaticLocation {
    async fn current_location(
        &self,
        _request: &LocationRequest,
    ) -> Result<GeoCoordinate, CapabilityError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.coordinate.ok_or(CapabilityError::Denied {
            capability: Capability::Location,
        })
    }
}

pub(super) type TestService = AttendanceService<ScriptedCamera, StaticLocation, MarkerDetector>;

pub(super) fn build_service(
    camera: ScriptedCamera,
    location: StaticLocation,
) -> (Arc<TestService>, Arc<ScriptedCamera>, Arc<StaticLocation>) {
    let bus = ChangeBus::with_reconcile_interval(Duration::from_secs(600));
    let control = Arc::new(AttendanceControl::new(bus));
    let camera = Arc::new(camera);
    let location = Arc::new(location);
    let service = AttendanceService::new(
        camera.clone(),
        location.clone(),
        QrScanner::new(MarkerDetector),
        FaceCapture::default(),
        control,
        GeofencePolicy::new(CAMPUS, 500.0),
    );
    (Arc::new(service), camera, location)
}
