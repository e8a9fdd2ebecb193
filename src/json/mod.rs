//! JSON exchange subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound:
//!     request body → security::limits (bounded read)
//!         → decode.rs (single value, strict keys, classified errors)
//!         → caller's target type
//!
//! Outbound:
//!     caller payload → response.rs (envelope + headers) → client
//!     caller payload → push.rs (POST) → remote service
//! ```
//!
//! # Design Decisions
//! - Decode failures are mapped to a fixed set of client-safe messages
//! - The envelope field names are a wire contract: `error`, `message`, `data`

pub mod decode;
pub mod push;
pub mod response;

pub use decode::{decode_json, read_json, StrictJson};
pub use push::RemotePush;
pub use response::{write_error, write_error_with_status, write_json, JsonResponse};
