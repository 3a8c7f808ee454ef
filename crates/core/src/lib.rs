//! Domain types, validation, and pure logic for the hyperlabel annotation
//! backend. Nothing in this crate touches the database.

pub mod annotation;
pub mod datasource;
pub mod display_algorithm;
pub mod error;
pub mod project;
pub mod sample;
pub mod statistics;
pub mod types;
