//! Integration specifications for attendance gating end to end: arming,
//! geofencing, the QR decode loop, and the idempotency guard, driven through
//! the public service facade against simulated capability sources.

mod common {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::time::Duration;

    use smartpresence::store::ChangeBus;
    use smartpresence::workflows::attendance::{
        AttendanceControl, AttendanceService, CameraConstraints, CameraFeed, CameraSource,
        CapabilityError, FaceCapture, Frame, GeoCoordinate, GeofencePolicy, LocationRequest,
        LocationSource, QrDetector, QrScanner,
    };

    pub(crate) const CAMPUS: GeoCoordinate = GeoCoordinate::new(25.637146, 85.012951);
    pub(crate) const NEARBY: GeoCoordinate = GeoCoordinate::new(25.641500, 85.012951);

    pub(crate) fn payload_frame(payload: &str) -> Frame {
        Frame {
            width: 640,
            height: 480,
            luma: payload.as_bytes().to_vec(),
        }
    }

    pub(crate) fn blank_frame() -> Frame {
        Frame {
            width: 640,
            height: 480,
            luma: Vec::new(),
        }
    }

    pub(crate) struct MarkerDetector;

    impl QrDetector for MarkerDetector {
        fn detect(&self, frame: &Frame) -> Option<String> {
            let text = std::str::from_utf8(&frame.luma).ok()?;
            text.starts_with("ATT").then(|| text.to_string())
        }
    }

    /// Camera double replaying a frame script, counting acquisitions.
    pub(crate) struct ScriptedCamera {
        frames: Vec<Frame>,
        acquisitions: AtomicUsize,
    }

    impl ScriptedCamera {
        pub(crate) fn with_frames(frames: Vec<Frame>) -> Self {
            Self {
                frames,
                acquisitions: AtomicUsize::new(0),
            }
        }

        pub(crate) fn acquisitions(&self) -> usize {
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
            let frames = self.frames.clone();
            let (sender, feed) = CameraFeed::channel(8);
            tokio::spawn(async move {
                for frame in frames {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    if !sender.offer(frame) {
                        return;
                    }
                }
                sender.released().await;
            });
            Ok(feed)
        }
    }

    pub(crate) struct StaticLocation {
        coordinate: GeoCoordinate,
        requests: AtomicUsize,
    }

    impl StaticLocation {
        pub(crate) fn at(coordinate: GeoCoordinate) -> Self {
            Self {
                coordinate,
                requests: AtomicUsize::new(0),
            }
        }

        pub(crate) fn requests(&self) -> usize {
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
            Ok(self.coordinate)
        }
    }

    pub(crate) type TestService = AttendanceService<ScriptedCamera, StaticLocation, MarkerDetector>;

    pub(crate) fn build_service(
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
}

mod marking_scenario {
    use super::common::*;
    use smartpresence::workflows::attendance::{AttendanceError, CaptureMode, ClassMode};

    #[tokio::test(start_paused = true)]
    async fn qr_session_end_to_end_with_idempotency() {
        let camera = ScriptedCamera::with_frames(vec![
            blank_frame(),
            blank_frame(),
            payload_frame("ATT-STUDENT-25"),
        ]);
        let (service, camera, location) = build_service(camera, StaticLocation::at(NEARBY));

        service.arm_session("teacher-1", CaptureMode::Qr, "Mathematics", "10-A");

        let receipt = service
            .mark_attendance("student-25", CaptureMode::Qr)
            .await
            .expect("first marking succeeds");
        assert_eq!(receipt.payload.as_deref(), Some("ATT-STUDENT-25"));
        assert_eq!(receipt.subject, "Mathematics");
        assert_eq!(location.requests(), 1);
        assert_eq!(camera.acquisitions(), 1);

        // Repeat submission is refused before any capability is touched.
        let second = service.mark_attendance("student-25", CaptureMode::Qr).await;
        assert!(matches!(second, Err(AttendanceError::AlreadyMarked { .. })));
        assert_eq!(camera.acquisitions(), 1);
        assert_eq!(location.requests(), 1);

        // A different student still gets through on the same session.
        let other = service
            .mark_attendance("student-31", CaptureMode::Qr)
            .await
            .expect("other student marks");
        assert_eq!(other.user_id, "student-31");
        assert_eq!(camera.acquisitions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_to_online_drops_the_location_gate() {
        let camera = ScriptedCamera::with_frames(vec![payload_frame("ATT-1")]);
        let (service, _, location) = build_service(camera, StaticLocation::at(NEARBY));

        service.arm_session("teacher-1", CaptureMode::Qr, "Physics", "10-A");

        service.set_class_mode(ClassMode::Online);
        service
            .mark_attendance("student-25", CaptureMode::Qr)
            .await
            .expect("marking succeeds online");
        assert_eq!(location.requests(), 0);

        service.set_class_mode(ClassMode::Offline);
        service
            .mark_attendance("student-31", CaptureMode::Qr)
            .await
            .expect("marking succeeds offline inside the fence");
        assert_eq!(location.requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_budget_elapses_without_a_code() {
        use smartpresence::workflows::attendance::NO_CODE_FOUND;
        use tokio::time::{Duration, Instant};

        // A camera that only ever produces undecodable frames.
        let frames = vec![blank_frame(); 4];
        let (service, camera, _) =
            build_service(ScriptedCamera::with_frames(frames), StaticLocation::at(NEARBY));
        service.arm_session("teacher-1", CaptureMode::Qr, "Mathematics", "10-A");

        let started = Instant::now();
        let result = service.mark_attendance("student-25", CaptureMode::Qr).await;
        let elapsed = started.elapsed();

        match result {
            Err(AttendanceError::ScanFailed { reason }) => {
                assert_eq!(reason, NO_CODE_FOUND);
            }
            other => panic!("expected scan failure, got {other:?}"),
        }
        assert!(elapsed >= Duration::from_millis(10_000), "fired at {elapsed:?}");
        assert_eq!(camera.acquisitions(), 1);

        // A failed capture leaves no marker: retrying is allowed.
        let retry = service.mark_attendance("student-25", CaptureMode::Qr).await;
        assert!(matches!(retry, Err(AttendanceError::ScanFailed { .. })));
        assert_eq!(camera.acquisitions(), 2);
    }
}
