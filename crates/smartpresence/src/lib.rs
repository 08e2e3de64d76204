//! Core state machines for the SmartPresence attendance portal.
//!
//! The crate hosts the pieces of the portal with real state and failure
//! semantics: the leave application workflow, the role-scoped notification
//! fan-out, and the attendance gating controller with its geofence check and
//! capture loops. Presentation layers (dashboards, dialogs) stay outside and
//! reach this core through the workflow services and routers, binding real
//! hardware to the `CameraSource`/`LocationSource` seams.

pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
