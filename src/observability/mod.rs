//! Observability module
//!
//! Logging, metrics, and structured event infrastructure for watching a
//! stage run.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventEmitter, StageEvent};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
