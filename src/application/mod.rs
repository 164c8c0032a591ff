//! Application layer - URL resolution and probe coordination
//!
//! Ties the domain model to a prober implementation without knowing how the
//! probe is carried out.

pub mod coordinator;
pub mod resolver;

// Re-export commonly used items
pub use coordinator::{ProbeCoordinator, ProbeJob, ProbeProgress, ProbeSettings};
pub use resolver::UrlResolver;
