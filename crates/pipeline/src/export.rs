//! Project export.
//!
//! [`export_project`] loads a project's sample tree and hands it to
//! [`assemble_export`], which applies the inclusion options. The assembly is
//! pure so the filtering rules can be tested without a database.

use hyperlabel_core::annotation::SpectrumPoint;
use hyperlabel_core::types::{DbId, Timestamp};
use hyperlabel_db::models::annotation::{
    AnnotationSpectrum, DetailModeSnapshot, DetailWithChildren, SampleWithAnnotations,
};
use hyperlabel_db::models::project::Project;
use hyperlabel_db::models::sample::Sample;
use hyperlabel_db::repositories::{AnnotationRepo, ProjectRepo, SampleRepo};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::{PipelineError, PipelineResult};
use crate::snapshot::begin_snapshot;

/// Sample fields every export carries regardless of options.
pub const ALWAYS_INCLUDED: &[&str] = &["status", "isAnnotated", "lastAnnotatedBy"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which sections to include. Each flag defaults to `true` when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "included")]
    pub include_project_meta: bool,
    #[serde(default = "included")]
    pub include_sample_meta: bool,
    #[serde(default = "included")]
    pub include_annotation_bundle: bool,
}

fn included() -> bool {
    true
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_project_meta: true,
            include_sample_meta: true,
            include_annotation_bundle: true,
        }
    }
}

impl ExportOptions {
    /// Whether the sample tree has to be loaded at all.
    pub fn needs_samples(&self) -> bool {
        self.include_sample_meta || self.include_annotation_bundle
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub project: ExportProject,
    pub included_sections: IncludedSections,
    pub generated_at: Timestamp,
    pub samples: Vec<ExportSampleBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProject {
    pub project_identifier: String,
    #[serde(flatten)]
    pub meta: Option<ExportProjectMeta>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProjectMeta {
    pub id: DbId,
    pub name: String,
    pub priority: String,
    pub completion_rate: f64,
    pub available_samples: i64,
    pub total_samples: i64,
    pub is_archived: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedSections {
    pub project_meta: bool,
    pub sample_meta: bool,
    pub annotation_bundle: bool,
    pub always: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSampleBlock {
    pub sample_identifier: String,
    pub meta: Option<ExportSampleMeta>,
    pub annotations: Option<Vec<ExportAnnotationRecord>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSampleMeta {
    pub id: DbId,
    pub sample_type: String,
    pub source_files: Vec<String>,
    pub status: String,
    pub is_annotated: bool,
    pub last_annotated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAnnotationRecord {
    pub detail: ExportDetail,
    pub mode_snapshot: Option<ExportModeSnapshot>,
    pub spectra: Vec<ExportSpectrum>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDetail {
    pub detail_identifier: String,
    pub sample_identifier: String,
    pub label_name: String,
    pub color: String,
    pub tool_type: String,
    pub coordinates: serde_json::Value,
    pub radius: Option<f64>,
    pub area: Option<f64>,
    pub confidence: Option<f64>,
    pub remark: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportModeSnapshot {
    pub detail_identifier: String,
    pub r_channel: i32,
    pub g_channel: i32,
    pub b_channel: i32,
    pub r_gain: f64,
    pub g_gain: f64,
    pub b_gain: f64,
    pub gain_algorithm: String,
    pub dark_calibration: bool,
    pub white_calibration: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSpectrum {
    pub detail_identifier: String,
    pub position: Option<serde_json::Value>,
    pub points: Vec<SpectrumPoint>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Build the export document from an already loaded project graph.
///
/// `samples` is ignored unless one of the sample options is set. Mode
/// snapshots and spectra are only emitted for hyperspectral samples.
pub fn assemble_export(
    project: &Project,
    samples: &[SampleWithAnnotations],
    options: ExportOptions,
    generated_at: Timestamp,
) -> ExportDocument {
    let meta = options.include_project_meta.then(|| ExportProjectMeta {
        id: project.id,
        name: project.name.clone(),
        priority: project.priority.clone(),
        completion_rate: project.completion_rate,
        available_samples: project.available_samples,
        total_samples: project.total_samples,
        is_archived: project.is_archived,
        created_at: project.created_at,
        updated_at: project.updated_at,
    });

    let samples = if options.needs_samples() {
        samples.iter().map(|s| sample_block(s, options)).collect()
    } else {
        Vec::new()
    };

    ExportDocument {
        project: ExportProject {
            project_identifier: project.external_id.clone(),
            meta,
        },
        included_sections: IncludedSections {
            project_meta: options.include_project_meta,
            sample_meta: options.include_sample_meta,
            annotation_bundle: options.include_annotation_bundle,
            always: ALWAYS_INCLUDED,
        },
        generated_at,
        samples,
    }
}

fn sample_block(entry: &SampleWithAnnotations, options: ExportOptions) -> ExportSampleBlock {
    let sample = &entry.sample;
    let hyperspectral = sample.kind().is_hyperspectral();

    let meta = options.include_sample_meta.then(|| sample_meta(sample));
    let annotations = options.include_annotation_bundle.then(|| {
        entry
            .annotations
            .iter()
            .map(|node| annotation_record(sample, node, hyperspectral))
            .collect()
    });

    ExportSampleBlock {
        sample_identifier: sample.external_id.clone(),
        meta,
        annotations,
    }
}

fn sample_meta(sample: &Sample) -> ExportSampleMeta {
    ExportSampleMeta {
        id: sample.id,
        sample_type: sample.sample_type.clone(),
        source_files: sample.source_files.clone(),
        status: sample.status.clone(),
        is_annotated: sample.is_annotated,
        last_annotated_by: sample.last_annotated_by,
        created_at: sample.created_at,
        updated_at: sample.updated_at,
    }
}

fn annotation_record(
    sample: &Sample,
    node: &DetailWithChildren,
    hyperspectral: bool,
) -> ExportAnnotationRecord {
    let detail = &node.detail;
    let detail_identifier = &detail.external_id;

    let mode_snapshot = if hyperspectral {
        node.mode_snapshot
            .as_ref()
            .map(|mode| mode_record(detail_identifier, mode))
    } else {
        None
    };

    let spectra = if hyperspectral {
        node.spectra
            .iter()
            .map(|s| spectrum_record(detail_identifier, s))
            .collect()
    } else {
        Vec::new()
    };

    ExportAnnotationRecord {
        detail: ExportDetail {
            detail_identifier: detail_identifier.clone(),
            sample_identifier: sample.external_id.clone(),
            label_name: detail.label_name.clone(),
            color: detail.color.clone(),
            tool_type: detail.tool_type.clone(),
            coordinates: detail.coordinates.clone(),
            radius: detail.radius,
            area: detail.area,
            confidence: detail.confidence,
            remark: detail.remark.clone(),
            created_at: detail.created_at,
            updated_at: detail.updated_at,
        },
        mode_snapshot,
        spectra,
    }
}

fn mode_record(detail_identifier: &str, mode: &DetailModeSnapshot) -> ExportModeSnapshot {
    ExportModeSnapshot {
        detail_identifier: detail_identifier.to_string(),
        r_channel: mode.r_channel,
        g_channel: mode.g_channel,
        b_channel: mode.b_channel,
        r_gain: mode.r_gain,
        g_gain: mode.g_gain,
        b_gain: mode.b_gain,
        gain_algorithm: mode.gain_algorithm.clone(),
        dark_calibration: mode.dark_calibration,
        white_calibration: mode.white_calibration,
        created_at: mode.created_at,
        updated_at: mode.updated_at,
    }
}

fn spectrum_record(detail_identifier: &str, spectrum: &AnnotationSpectrum) -> ExportSpectrum {
    ExportSpectrum {
        detail_identifier: detail_identifier.to_string(),
        position: spectrum.position.clone(),
        points: spectrum.points.0.clone(),
        created_at: spectrum.created_at,
        updated_at: spectrum.updated_at,
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Export a project. The sample tree is only loaded when a sample section is
/// requested, and then in a fixed number of queries regardless of size.
///
/// All reads run in one read-only snapshot, so the project row and the whole
/// sample tree reflect the same committed state.
pub async fn export_project(
    pool: &PgPool,
    project_id: DbId,
    options: ExportOptions,
) -> PipelineResult<ExportDocument> {
    let mut tx = begin_snapshot(pool).await?;

    let project = ProjectRepo::find_by_id_in(&mut *tx, project_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("Project", project_id))?;

    let samples = if options.needs_samples() {
        load_sample_graph(&mut *tx, project_id).await?
    } else {
        Vec::new()
    };

    tx.commit().await?;

    let document = assemble_export(&project, &samples, options, chrono::Utc::now());
    tracing::info!(
        project_id,
        samples = document.samples.len(),
        include_project_meta = options.include_project_meta,
        include_sample_meta = options.include_sample_meta,
        include_annotation_bundle = options.include_annotation_bundle,
        "Project exported",
    );
    Ok(document)
}

async fn load_sample_graph(
    conn: &mut PgConnection,
    project_id: DbId,
) -> PipelineResult<Vec<SampleWithAnnotations>> {
    let samples = SampleRepo::list_by_project(conn, project_id).await?;
    let ids: Vec<DbId> = samples.iter().map(|s| s.id).collect();
    let mut trees = AnnotationRepo::load_trees(conn, &ids).await?;

    Ok(samples
        .into_iter()
        .map(|sample| SampleWithAnnotations {
            annotations: trees.remove(&sample.id).unwrap_or_default(),
            sample,
        })
        .collect())
}
