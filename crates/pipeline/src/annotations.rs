//! Annotation replacement.
//!
//! A replace discards a sample's whole annotation subtree and rebuilds it from
//! the submitted payload. The delete, the inserts, the sample flags and the
//! project statistics all commit in one transaction, with the sample row
//! locked so concurrent replaces of the same sample serialise.

use hyperlabel_core::annotation::{validate_replace_payload, ReplaceAnnotations};
use hyperlabel_core::types::DbId;
use hyperlabel_db::models::annotation::SampleWithAnnotations;
use hyperlabel_db::repositories::{AnnotationRepo, SampleRepo};
use sqlx::PgPool;

use crate::error::{PipelineError, PipelineResult};
use crate::resolver::AlgorithmCache;
use crate::samples::load_sample;
use crate::statistics;

/// Replace every annotation of a sample with `payload`.
///
/// The payload is validated before anything is written. The returned sample
/// is reloaded inside the same transaction just before commit, so any error
/// from this call means nothing was written.
pub async fn replace_annotations(
    pool: &PgPool,
    sample_id: DbId,
    payload: &ReplaceAnnotations,
    actor_id: Option<DbId>,
) -> PipelineResult<SampleWithAnnotations> {
    validate_replace_payload(payload)?;

    let mut tx = pool.begin().await?;

    let sample = SampleRepo::lock_by_id(&mut *tx, sample_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("Sample", sample_id))?;

    let removed = AnnotationRepo::delete_by_sample(&mut *tx, sample_id).await?;

    let mut cache = AlgorithmCache::new();
    for input in &payload.annotations {
        let detail = AnnotationRepo::create_detail(&mut *tx, sample_id, input).await?;

        if let Some(mode) = &input.mode_snapshot {
            let algorithm_id = cache
                .resolve_id(&mut *tx, mode.gain_algorithm.as_deref())
                .await?;
            AnnotationRepo::create_mode_snapshot(&mut *tx, detail.id, mode, algorithm_id).await?;
        }

        for spectrum in input.spectra.iter().flatten() {
            AnnotationRepo::create_spectrum(&mut *tx, detail.id, spectrum).await?;
        }
    }

    let is_annotated = payload.resulting_annotated_flag();
    SampleRepo::set_annotation_state(&mut *tx, sample_id, is_annotated, actor_id).await?;
    statistics::recompute(&mut *tx, sample.project_id).await?;
    let replaced = load_sample(&mut *tx, sample_id).await?;

    tx.commit().await?;

    tracing::info!(
        sample_id,
        project_id = sample.project_id,
        removed,
        inserted = payload.annotations.len(),
        is_annotated,
        actor_id = ?actor_id,
        "Annotations replaced",
    );

    Ok(replaced)
}
