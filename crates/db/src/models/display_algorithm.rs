//! Display (gain) algorithm reference rows.

use hyperlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `display_algorithms` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct DisplayAlgorithm {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
