//! Transactional operations over the annotation store: replacing a sample's
//! annotations, recomputing project statistics, exporting projects, and the
//! project and sample lifecycle around them.

pub mod annotations;
pub mod error;
pub mod export;
pub mod projects;
pub mod resolver;
pub mod samples;
pub mod snapshot;
pub mod statistics;

pub use error::{ErrorKind, PipelineError, PipelineResult};
