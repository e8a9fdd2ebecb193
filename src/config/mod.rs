//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ToolkitConfig (validated, immutable)
//!     → UploadPolicy / JsonPolicy cloned into each call site
//! ```
//!
//! # Design Decisions
//! - No process-wide settings: every operation takes its policy by value or
//!   reference, so concurrent callers can run with different limits
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{JsonPolicy, ObservabilityConfig, StorageConfig, ToolkitConfig, UploadPolicy};
pub use validation::{validate_config, ValidationError};
