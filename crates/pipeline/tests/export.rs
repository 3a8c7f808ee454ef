//! Integration tests for project export against a real database.

mod common;

use common::{detail, payload, seed_project, with_spectra};
use hyperlabel_core::sample::SampleType;
use hyperlabel_db::repositories::{AnnotationRepo, SampleRepo};
use hyperlabel_pipeline::annotations::replace_annotations;
use hyperlabel_pipeline::export::{export_project, ExportOptions};
use hyperlabel_pipeline::snapshot::begin_snapshot;
use hyperlabel_pipeline::ErrorKind;
use serde_json::json;
use sqlx::PgPool;

/// One hyperspectral and one image sample, both annotated with the same
/// detail carrying a snapshot and one spectrum.
async fn seeded_project(pool: &PgPool) -> i64 {
    let (project, samples) = seed_project(
        pool,
        "Export",
        &[SampleType::Hyperspectral, SampleType::Image],
    )
    .await;
    for sample in &samples {
        replace_annotations(
            pool,
            sample.id,
            &payload(vec![with_spectra(detail("leaf", Some("gamma")), &[450.0])]),
            Some(8),
        )
        .await
        .unwrap();
    }
    project.id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_export_filters_by_sample_type(pool: PgPool) {
    let project_id = seeded_project(&pool).await;

    let doc = export_project(&pool, project_id, ExportOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.samples.len(), 2);

    let hyper = &doc.samples[0].annotations.as_ref().unwrap()[0];
    assert_eq!(hyper.mode_snapshot.as_ref().unwrap().gain_algorithm, "gamma");
    assert_eq!(hyper.spectra.len(), 1);

    let image = &doc.samples[1].annotations.as_ref().unwrap()[0];
    assert!(image.mode_snapshot.is_none());
    assert!(image.spectra.is_empty());

    let meta = doc.samples[1].meta.as_ref().unwrap();
    assert!(meta.is_annotated);
    assert_eq!(meta.last_annotated_by, Some(8));

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["project"]["completionRate"], 100.0);
    assert_eq!(value["project"]["totalSamples"], 2);
    assert_eq!(value["samples"][1]["annotations"][0]["spectra"], json!([]));
    assert_eq!(
        value["samples"][1]["annotations"][0]["modeSnapshot"],
        serde_json::Value::Null
    );
    assert_eq!(
        value["samples"][0]["annotations"][0]["spectra"][0]["points"],
        json!([{"wavelength": 450.0, "intensity": 0.5}])
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_with_everything_off(pool: PgPool) {
    let project_id = seeded_project(&pool).await;
    let options = ExportOptions {
        include_project_meta: false,
        include_sample_meta: false,
        include_annotation_bundle: false,
    };

    let doc = export_project(&pool, project_id, options).await.unwrap();
    assert_eq!(doc.project.project_identifier.len(), 32);
    assert!(doc.project.meta.is_none());
    assert!(doc.samples.is_empty());

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(
        value["includedSections"],
        json!({
            "projectMeta": false,
            "sampleMeta": false,
            "annotationBundle": false,
            "always": ["status", "isAnnotated", "lastAnnotatedBy"],
        })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_of_project_without_samples(pool: PgPool) {
    let (project, _) = seed_project(&pool, "Bare", &[]).await;
    let doc = export_project(&pool, project.id, ExportOptions::default())
        .await
        .unwrap();
    assert!(doc.samples.is_empty());
    assert_eq!(doc.project.meta.as_ref().unwrap().total_samples, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_missing_project(pool: PgPool) {
    let err = export_project(&pool, 31337, ExportOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_snapshot_reads_ignore_replaces_committed_meanwhile(pool: PgPool) {
    let (_, samples) = seed_project(&pool, "Snapshot", &[SampleType::Hyperspectral]).await;
    let sample_id = samples[0].id;
    replace_annotations(
        &pool,
        sample_id,
        &payload(vec![with_spectra(detail("old", Some("gamma")), &[450.0])]),
        None,
    )
    .await
    .unwrap();

    let mut snapshot = begin_snapshot(&pool).await.unwrap();
    let sample = SampleRepo::find_by_id_in(&mut *snapshot, sample_id)
        .await
        .unwrap()
        .unwrap();
    assert!(sample.is_annotated);

    // Commits between the first and the remaining reads of the snapshot.
    replace_annotations(&pool, sample_id, &payload(vec![]), None)
        .await
        .unwrap();

    let trees = AnnotationRepo::load_trees(&mut *snapshot, &[sample_id])
        .await
        .unwrap();
    let nodes = &trees[&sample_id];
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].detail.label_name, "old");
    assert!(nodes[0].mode_snapshot.is_some());
    assert_eq!(nodes[0].spectra.len(), 1);

    let write = sqlx::query("UPDATE samples SET status = 'ignored' WHERE id = $1")
        .bind(sample_id)
        .execute(&mut *snapshot)
        .await
        .unwrap_err();
    let code = write.as_database_error().and_then(|e| e.code()).unwrap();
    assert_eq!(code, "25006");
    snapshot.rollback().await.unwrap();

    let doc = export_project(&pool, samples[0].project_id, ExportOptions::default())
        .await
        .unwrap();
    assert_eq!(doc.samples[0].annotations.as_ref().unwrap().len(), 0);
}
