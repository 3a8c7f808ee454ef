//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Read-only
//! lookups accept `&PgPool`; anything that participates in a multi-statement
//! unit of work accepts `&mut PgConnection` so callers can pass a
//! transaction (`&mut *tx`) or a pooled connection.

pub mod annotation_repo;
pub mod display_algorithm_repo;
pub mod project_repo;
pub mod sample_repo;

pub use annotation_repo::AnnotationRepo;
pub use display_algorithm_repo::DisplayAlgorithmRepo;
pub use project_repo::ProjectRepo;
pub use sample_repo::SampleRepo;
