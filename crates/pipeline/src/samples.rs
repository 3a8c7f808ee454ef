//! Sample queries and status changes.

use hyperlabel_core::sample::SampleStatusUpdate;
use hyperlabel_core::types::DbId;
use hyperlabel_db::models::annotation::SampleWithAnnotations;
use hyperlabel_db::models::sample::Sample;
use hyperlabel_db::repositories::{AnnotationRepo, ProjectRepo, SampleRepo};
use sqlx::{PgConnection, PgPool};

use crate::error::{PipelineError, PipelineResult};
use crate::snapshot::begin_snapshot;
use crate::statistics;

/// List a project's samples in insertion order.
pub async fn list_samples(pool: &PgPool, project_id: DbId) -> PipelineResult<Vec<Sample>> {
    let mut tx = begin_snapshot(pool).await?;
    if ProjectRepo::find_by_id_in(&mut *tx, project_id).await?.is_none() {
        return Err(PipelineError::not_found("Project", project_id));
    }
    let samples = SampleRepo::list_by_project(&mut *tx, project_id).await?;
    tx.commit().await?;
    Ok(samples)
}

/// Load a sample with its full annotation subtree, details in insertion order.
pub async fn get_sample(pool: &PgPool, sample_id: DbId) -> PipelineResult<SampleWithAnnotations> {
    let mut tx = begin_snapshot(pool).await?;
    let loaded = load_sample(&mut *tx, sample_id).await?;
    tx.commit().await?;
    Ok(loaded)
}

/// [`get_sample`] on the caller's connection.
pub(crate) async fn load_sample(
    conn: &mut PgConnection,
    sample_id: DbId,
) -> PipelineResult<SampleWithAnnotations> {
    let sample = SampleRepo::find_by_id_in(conn, sample_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("Sample", sample_id))?;

    let mut trees = AnnotationRepo::load_trees(conn, &[sample_id]).await?;

    Ok(SampleWithAnnotations {
        annotations: trees.remove(&sample_id).unwrap_or_default(),
        sample,
    })
}

/// Change a sample's status, optionally overriding its annotated flag, and
/// refresh the owning project's statistics in the same transaction.
pub async fn update_sample_status(
    pool: &PgPool,
    sample_id: DbId,
    update: &SampleStatusUpdate,
) -> PipelineResult<SampleWithAnnotations> {
    let mut tx = pool.begin().await?;

    let sample = SampleRepo::update_status(&mut *tx, sample_id, update.status, update.is_annotated)
        .await?
        .ok_or_else(|| PipelineError::not_found("Sample", sample_id))?;
    statistics::recompute(&mut *tx, sample.project_id).await?;
    let updated = load_sample(&mut *tx, sample_id).await?;

    tx.commit().await?;

    tracing::info!(
        sample_id,
        project_id = sample.project_id,
        status = update.status.as_str(),
        is_annotated = sample.is_annotated,
        "Sample status updated",
    );

    Ok(updated)
}
