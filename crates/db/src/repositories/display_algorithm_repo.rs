//! Repository for the `display_algorithms` table.

use hyperlabel_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::display_algorithm::DisplayAlgorithm;

const COLUMNS: &str = "id, code, name, description, created_at, updated_at";

/// Read-only access to the seeded display algorithms.
pub struct DisplayAlgorithmRepo;

impl DisplayAlgorithmRepo {
    /// List all algorithms in seed order.
    pub async fn list(pool: &PgPool) -> Result<Vec<DisplayAlgorithm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM display_algorithms ORDER BY id ASC");
        sqlx::query_as::<_, DisplayAlgorithm>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find an algorithm by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DisplayAlgorithm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM display_algorithms WHERE id = $1");
        sqlx::query_as::<_, DisplayAlgorithm>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an algorithm by exact code.
    pub async fn find_by_code(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<DisplayAlgorithm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM display_algorithms WHERE code = $1");
        sqlx::query_as::<_, DisplayAlgorithm>(&query)
            .bind(code)
            .fetch_optional(&mut *conn)
            .await
    }
}
