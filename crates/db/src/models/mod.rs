//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Insert/update DTOs where the table is written to directly

pub mod annotation;
pub mod display_algorithm;
pub mod project;
pub mod sample;
