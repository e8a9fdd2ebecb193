//! Input hardening subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request body:
//!     → limits.rs (declared length check, byte-counting stream)
//!     → sniff.rs (classify leading bytes)
//!     → filename.rs (reduce client names to a safe basename)
//!     → upload pipeline / JSON decoder
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure
//! - Limits enforced while streaming, never after buffering everything
//! - No trust in client input, including declared content types

pub mod filename;
pub mod limits;
pub mod sniff;

pub use limits::{BodyLimit, LimitExceeded};
pub use sniff::{sniff, sniff_reader, SNIFF_LEN};
