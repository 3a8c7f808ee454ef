//! Repository for the `samples` table.

use hyperlabel_core::sample::SampleStatus;
use hyperlabel_core::types::{new_external_id, DbId};
use sqlx::{PgConnection, PgPool};

use crate::models::sample::{CreateSample, Sample};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, external_id, sample_type, source_files, status, \
    is_annotated, last_annotated_by, created_at, updated_at";

/// Provides persistence operations for samples.
pub struct SampleRepo;

impl SampleRepo {
    /// Insert samples for a project in the given order, each with a fresh
    /// external identifier, `valid` status, and not annotated.
    pub async fn create_many(
        conn: &mut PgConnection,
        project_id: DbId,
        inputs: &[CreateSample],
    ) -> Result<Vec<Sample>, sqlx::Error> {
        let query = format!(
            "INSERT INTO samples (project_id, external_id, sample_type, source_files, status, is_annotated)
             VALUES ($1, $2, $3, $4, 'valid', false)
             RETURNING {COLUMNS}"
        );

        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let sample = sqlx::query_as::<_, Sample>(&query)
                .bind(project_id)
                .bind(new_external_id())
                .bind(input.sample_type.as_str())
                .bind(&input.source_files)
                .fetch_one(&mut *conn)
                .await?;
            created.push(sample);
        }
        Ok(created)
    }

    /// Find a sample by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = $1");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a sample on the caller's connection.
    pub async fn find_by_id_in(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = $1");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a sample and lock its row until the surrounding transaction ends.
    ///
    /// Concurrent writers to the same sample queue behind this lock.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List a project's samples in insertion order.
    pub async fn list_by_project(
        conn: &mut PgConnection,
        project_id: DbId,
    ) -> Result<Vec<Sample>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM samples WHERE project_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Sample>(&query)
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Record the outcome of an annotation replace.
    ///
    /// Returns `false` if the sample no longer exists.
    pub async fn set_annotation_state(
        conn: &mut PgConnection,
        id: DbId,
        is_annotated: bool,
        annotated_by: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE samples SET is_annotated = $2, last_annotated_by = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(is_annotated)
        .bind(annotated_by)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change a sample's status, optionally overriding its annotated flag.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: DbId,
        status: SampleStatus,
        is_annotated: Option<bool>,
    ) -> Result<Option<Sample>, sqlx::Error> {
        let query = format!(
            "UPDATE samples SET
                status = $2,
                is_annotated = COALESCE($3, is_annotated)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sample>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(is_annotated)
            .fetch_optional(&mut *conn)
            .await
    }
}
