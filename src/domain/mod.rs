//! Domain module - Core validation concepts
//!
//! Layer names and types, URL patterns, probe results and the final report.
//! Nothing in here performs I/O.

pub mod layer;
pub mod pattern;
pub mod probe_result;
pub mod report;
pub mod services;
pub mod value_objects;

// Re-export commonly used items
pub use layer::{Body, LayerType};
pub use pattern::{PatternError, PatternTable, Placeholder, RawUrlPattern, UrlPattern};
pub use probe_result::{ProbeResult, ProbeStatus};
pub use report::{ValidationOutcome, ValidationReport};
pub use services::Prober;
pub use value_objects::{Credential, LayerName};
