//! Live QR decode loop over an acquired camera feed.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::capture::{CameraFeed, Frame};

/// Wall-clock budget for a scan attempt when none is configured.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Terminal error reported when the budget elapses without a decode.
pub const NO_CODE_FOUND: &str = "no code found";

/// Outcome of one scan invocation, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrScanResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QrScanResult {
    pub fn decoded(data: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Per-frame code extraction. Implementations must be cheap enough to run
/// once per frame-ready tick.
pub trait QrDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Option<String>;
}

/// The decode loop: one detection attempt per delivered frame, bounded by a
/// hard deadline, stoppable through a [`CancellationToken`].
pub struct QrScanner<D> {
    detector: D,
    timeout: Duration,
}

impl<D> QrScanner<D>
where
    D: QrDetector,
{
    pub fn new(detector: D) -> Self {
        Self::with_timeout(detector, DEFAULT_SCAN_TIMEOUT)
    }

    pub fn with_timeout(detector: D, timeout: Duration) -> Self {
        Self { detector, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Consume frames until a code is decoded, the budget elapses, or `stop`
    /// fires.
    ///
    /// The loop suspends between frames — an idle feed is a no-op tick, not
    /// a busy poll. Whatever the exit path, the feed is released before the
    /// terminal result is returned, and the result is returned exactly once.
    pub async fn scan(&self, feed: &mut CameraFeed, stop: &CancellationToken) -> QrScanResult {
        let deadline = Instant::now() + self.timeout;
        let mut frames_seen = 0u64;

        let result = loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    tracing::debug!(frames_seen, "qr scan stopped before a decode");
                    break QrScanResult::failed("scan stopped");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::debug!(frames_seen, "qr scan timed out");
                    break QrScanResult::failed(NO_CODE_FOUND);
                }
                frame = feed.next_frame() => {
                    match frame {
                        Some(frame) => {
                            frames_seen += 1;
                            if let Some(payload) = self.detector.detect(&frame) {
                                tracing::debug!(frames_seen, "qr code decoded");
                                break QrScanResult::decoded(payload);
                            }
                        }
                        None => {
                            // Feed released or binder gone; the device is no
                            // longer delivering frames.
                            break QrScanResult::failed("camera feed closed");
                        }
                    }
                }
            }
        };

        feed.release();
        result
    }
}
