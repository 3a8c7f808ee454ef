//! Repository for the `projects` table.

use hyperlabel_core::project::ProjectListQuery;
use hyperlabel_core::statistics::SampleCounts;
use hyperlabel_core::types::{new_external_id, DbId};
use sqlx::{PgConnection, PgPool};

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, external_id, name, priority, completion_rate, available_samples, \
    total_samples, is_archived, created_by, updated_by, created_at, updated_at";

/// Provides CRUD and statistics operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project with a fresh external identifier and zeroed statistics.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (external_id, name, priority, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(new_external_id())
            .bind(&input.name)
            .bind(input.priority.as_str())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project on the caller's connection, so the read shares its
    /// transaction snapshot.
    pub async fn find_by_id_in(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List one page of projects, newest first, with the total matching count.
    ///
    /// Paging parameters are assumed to be validated by the caller.
    pub async fn list(
        pool: &PgPool,
        filter: &ProjectListQuery,
    ) -> Result<(Vec<Project>, i64), sqlx::Error> {
        let pattern = filter.search_pattern();

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM projects
             WHERE ($1::text IS NULL OR LOWER(name) LIKE $1)
               AND ($2::boolean IS NULL OR is_archived = $2)",
        )
        .bind(&pattern)
        .bind(filter.archived)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1::text IS NULL OR LOWER(name) LIKE $1)
               AND ($2::boolean IS NULL OR is_archived = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        let items = sqlx::query_as::<_, Project>(&query)
            .bind(&pattern)
            .bind(filter.archived)
            .bind(filter.page_size)
            .bind(filter.offset())
            .fetch_all(pool)
            .await?;

        Ok((items, total))
    }

    /// Update a project's editable fields. Only `Some` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                priority = COALESCE($3, priority),
                updated_by = COALESCE($4, updated_by)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.priority.map(|p| p.as_str()))
            .bind(input.updated_by)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the archived flag. Archiving also resets priority to normal.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn set_archived(
        pool: &PgPool,
        id: DbId,
        archived: bool,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                is_archived = $2,
                priority = CASE WHEN $2 THEN 'normal' ELSE priority END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(archived)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project and, by cascade, its whole sample tree.
    /// Returns `true` if a row was removed.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Statistics ───────────────────────────────────────────────────

    /// Lock a project row until the surrounding transaction ends.
    ///
    /// Statistics writers take this before counting, so each one counts
    /// after the previous writer has committed. Returns `false` if the
    /// project does not exist.
    pub async fn lock_by_id(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.is_some())
    }

    /// Count a project's samples: all, annotated, and not ignored.
    pub async fn count_samples(
        conn: &mut PgConnection,
        project_id: DbId,
    ) -> Result<SampleCounts, sqlx::Error> {
        let (total, annotated, available): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE is_annotated),
                    COUNT(*) FILTER (WHERE status <> 'ignored')
             FROM samples
             WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(SampleCounts {
            total,
            annotated,
            available,
        })
    }

    /// Write derived statistics onto the project row.
    ///
    /// Returns `false` if the project no longer exists.
    pub async fn apply_statistics(
        conn: &mut PgConnection,
        project_id: DbId,
        counts: &SampleCounts,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET
                total_samples = $2,
                available_samples = $3,
                completion_rate = $4
             WHERE id = $1",
        )
        .bind(project_id)
        .bind(counts.total)
        .bind(counts.available)
        .bind(counts.completion_rate())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
