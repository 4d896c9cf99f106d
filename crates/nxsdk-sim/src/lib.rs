//! Simulated NX-SDK host
//!
//! Provides:
//! - `SimHost`, an in-process implementation of the bridge's `Host` trait
//! - console and trace recorders
//! - scripted event replay from JSON
//! - fixtures for host records and a handler that records every call

pub mod fixtures;
mod host;
mod recorder;
mod script;

pub use fixtures::{EventRecord, RecordingHandler};
pub use host::{Delivery, SimHost};
pub use recorder::{ConsoleRecorder, TraceEntry, TraceKind, TraceRecorder};
pub use script::{ScriptError, ScriptedEvent};
