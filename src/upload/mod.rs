//! Multipart upload subsystem.
//!
//! # Data Flow
//! ```text
//! request
//!     → security::limits (declared length, counted body stream)
//!     → multer (part framing)
//!     → pipeline.rs per file part:
//!         head buffer → security::sniff → allow-list
//!         → name assignment → temp file → fsync → rename
//!     → Vec<UploadedFile> in stream order
//! ```
//!
//! # Design Decisions
//! - A batch either fully succeeds or leaves nothing behind; committed files
//!   are removed when a later part fails
//! - A file only appears under its final name once every byte is on disk

pub mod pipeline;

pub use pipeline::{UploadedFile, Uploader};
