//! Process-wide tracing setup shared by every stockroom binary.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
