//! Metrics collection.
//!
//! # Metrics
//! - `toolkit_uploaded_files_total` (counter): files committed to storage
//! - `toolkit_uploaded_bytes_total` (counter): bytes committed to storage
//! - `toolkit_upload_rejections_total` (counter): failed upload calls by reason
//! - `toolkit_json_decode_failures_total` (counter): rejected JSON bodies by reason
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; exporting is the host's job
//! - Labels are fixed reason strings, never client-controlled values

use metrics::counter;

use crate::error::ToolkitError;

pub fn record_uploaded_file(bytes: u64) {
    counter!("toolkit_uploaded_files_total").increment(1);
    counter!("toolkit_uploaded_bytes_total").increment(bytes);
}

pub fn record_upload_rejection(err: &ToolkitError) {
    counter!("toolkit_upload_rejections_total", "reason" => err.reason()).increment(1);
}

pub fn record_json_failure(err: &ToolkitError) {
    counter!("toolkit_json_decode_failures_total", "reason" => err.reason()).increment(1);
}
