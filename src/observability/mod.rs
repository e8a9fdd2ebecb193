//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Upload pipeline, JSON codec, helpers produce:
//!     → tracing events (structured fields)
//!     → metrics.rs (counters through the `metrics` facade)
//!
//! Host application:
//!     → logging.rs installs the subscriber (optional)
//!     → installs a metrics recorder/exporter of its choice (optional)
//! ```
//!
//! # Design Decisions
//! - The library never installs global state on its own
//! - Metrics are cheap no-ops until the host installs a recorder

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
