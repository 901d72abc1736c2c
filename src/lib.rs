//! infographic-rs: period resolution and report aggregation engine.
//!
//! The crate resolves a reporting period (catalog preset or custom date
//! range), keeps it in sync with a navigable address, fetches one versioned
//! batch of report data per filter change and renders only the newest
//! completed batch as a set of panels.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod render;
pub mod source;
pub mod telemetry;

pub use api::{ReportEngine, ReportEngineConfig};
pub use error::{ReportError, ReportResult};
