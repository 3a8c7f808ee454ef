//! Project statistics recomputation.

use hyperlabel_core::statistics::SampleCounts;
use hyperlabel_core::types::DbId;
use hyperlabel_db::repositories::ProjectRepo;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::PipelineResult;

/// Derived counters written onto a project row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total_samples: i64,
    pub available_samples: i64,
    pub annotated_samples: i64,
    pub completion_rate: f64,
}

impl From<SampleCounts> for ProjectStats {
    fn from(counts: SampleCounts) -> Self {
        Self {
            total_samples: counts.total,
            available_samples: counts.available,
            annotated_samples: counts.annotated,
            completion_rate: counts.completion_rate(),
        }
    }
}

/// Recount a project's samples and store the result on the project row.
///
/// Runs on the caller's connection so it commits together with whatever
/// write triggered it. The project row is locked before counting, so two
/// transactions recomputing the same project serialise and the later one
/// counts the earlier one's committed rows. Returns `None` when the project
/// no longer exists.
pub async fn recompute(
    conn: &mut PgConnection,
    project_id: DbId,
) -> PipelineResult<Option<ProjectStats>> {
    if !ProjectRepo::lock_by_id(conn, project_id).await? {
        tracing::debug!(project_id, "Project vanished before recompute, skipping");
        return Ok(None);
    }

    let counts = ProjectRepo::count_samples(conn, project_id).await?;
    ProjectRepo::apply_statistics(conn, project_id, &counts).await?;

    let stats = ProjectStats::from(counts);
    tracing::debug!(
        project_id,
        total = stats.total_samples,
        available = stats.available_samples,
        completion_rate = stats.completion_rate,
        "Project statistics recomputed",
    );
    Ok(Some(stats))
}

/// [`recompute`] in its own transaction.
pub async fn recompute_project(
    pool: &PgPool,
    project_id: DbId,
) -> PipelineResult<Option<ProjectStats>> {
    let mut tx = pool.begin().await?;
    let stats = recompute(&mut *tx, project_id).await?;
    tx.commit().await?;
    Ok(stats)
}
