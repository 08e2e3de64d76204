//! Capability session management for camera and geolocation access.
//!
//! The core never touches hardware. The presentation layer implements
//! [`CameraSource`] and [`LocationSource`] and feeds frames through the
//! channel half of a [`CameraFeed`]. Release is modelled as a
//! `CancellationToken`: idempotent, observable by the binder, and fired on
//! every exit path because the feed also releases on `Drop`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::geofence::GeoCoordinate;

/// The capability a session manager call was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Camera,
    Location,
}

impl Capability {
    pub const fn label(self) -> &'static str {
        match self {
            Capability::Camera => "camera",
            Capability::Location => "location",
        }
    }
}

/// Failures surfaced by capability acquisition. None trigger automatic
/// retries; the human retries the action.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("{} access denied", capability.label())]
    Denied { capability: Capability },
    #[error("{} request timed out after {waited:?}", capability.label())]
    Timeout {
        capability: Capability,
        waited: Duration,
    },
    #[error("{} unavailable: {reason}", capability.label())]
    Unavailable {
        capability: Capability,
        reason: String,
    },
}

/// Resolution and facing hints passed to the camera binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: CameraFacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    User,
    Environment,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: CameraFacing::User,
        }
    }
}

/// A single luminance frame pulled from an active camera feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

/// Producer half handed to the hardware binder.
pub struct FrameSender {
    frames: mpsc::Sender<Frame>,
    released: CancellationToken,
}

impl FrameSender {
    /// Offer a frame to the consumer. Returns `false` once the feed has been
    /// released or the consumer is gone; a full buffer drops the frame
    /// silently — frames are disposable.
    pub fn offer(&self, frame: Frame) -> bool {
        if self.released.is_cancelled() {
            return false;
        }
        !matches!(
            self.frames.try_send(frame),
            Err(mpsc::error::TrySendError::Closed(_))
        )
    }

    pub fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }

    /// Resolves when the consumer releases the feed, so the binder can stop
    /// the device.
    pub async fn released(&self) {
        self.released.cancelled().await;
    }
}

/// Exclusive consumer handle on an acquired camera.
///
/// Every acquisition pairs with exactly one release: `release` is
/// idempotent, and dropping the feed releases as well, covering success,
/// error, and cancellation paths alike.
pub struct CameraFeed {
    frames: mpsc::Receiver<Frame>,
    released: CancellationToken,
}

impl CameraFeed {
    /// Build a connected binder/consumer pair.
    pub fn channel(buffer: usize) -> (FrameSender, CameraFeed) {
        let (tx, rx) = mpsc::channel(buffer);
        let released = CancellationToken::new();
        (
            FrameSender {
                frames: tx,
                released: released.clone(),
            },
            CameraFeed {
                frames: rx,
                released,
            },
        )
    }

    /// Wait for the next frame.
    ///
    /// Suspends while the source has nothing ready — an idle source is a
    /// no-op tick, not an error. Returns `None` once the feed is released or
    /// the binder went away.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        tokio::select! {
            _ = self.released.cancelled() => None,
            frame = self.frames.recv() => frame,
        }
    }

    /// Release the underlying device. Safe to call any number of times.
    pub fn release(&self) {
        self.released.cancel();
    }

    pub fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.release();
    }
}

/// Camera acquisition seam bound to real hardware by the presentation layer.
#[async_trait]
pub trait CameraSource: Send + Sync {
    async fn acquire(&self, constraints: CameraConstraints) -> Result<CameraFeed, CapabilityError>;
}

/// Hints for a one-shot location read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// A cached fix no older than this is acceptable.
    pub max_age: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(60),
        }
    }
}

/// One-shot geolocation seam.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_location(
        &self,
        request: &LocationRequest,
    ) -> Result<GeoCoordinate, CapabilityError>;
}

/// Read the current location, enforcing the request's wall-clock budget
/// regardless of how the underlying source behaves.
pub async fn read_location<L>(
    source: &L,
    request: LocationRequest,
) -> Result<GeoCoordinate, CapabilityError>
where
    L: LocationSource + ?Sized,
{
    match tokio::time::timeout(request.timeout, source.current_location(&request)).await {
        Ok(result) => result,
        Err(_) => Err(CapabilityError::Timeout {
            capability: Capability::Location,
            waited: request.timeout,
        }),
    }
}

/// Timed face capture: hold the acquired camera for a fixed settle delay,
/// then release it. The hardware binding performs no recognition here; the
/// core only guarantees the acquire/settle/release protocol.
#[derive(Debug, Clone, Copy)]
pub struct FaceCapture {
    settle: Duration,
}

impl FaceCapture {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    pub async fn capture(&self, feed: CameraFeed) {
        tokio::time::sleep(self.settle).await;
        feed.release();
    }
}

impl Default for FaceCapture {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
        }
    }
}
