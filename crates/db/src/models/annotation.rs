//! Annotation detail, mode snapshot, and spectrum rows, plus the assembled
//! sample-with-annotations tree.

use hyperlabel_core::annotation::SpectrumPoint;
use hyperlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::sample::Sample;

/// A row from the `annotation_details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationDetail {
    pub id: DbId,
    pub sample_id: DbId,
    pub external_id: String,
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

/// A row from `annotation_detail_modes`, joined with its algorithm's code.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DetailModeSnapshot {
    pub id: DbId,
    pub detail_id: DbId,
    pub r_channel: i32,
    pub g_channel: i32,
    pub b_channel: i32,
    pub r_gain: f64,
    pub g_gain: f64,
    pub b_gain: f64,
    pub gain_algorithm_id: DbId,
    /// Code of the referenced display algorithm.
    pub gain_algorithm: String,
    pub dark_calibration: bool,
    pub white_calibration: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `annotation_spectra` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationSpectrum {
    pub id: DbId,
    pub detail_id: DbId,
    pub position: Option<serde_json::Value>,
    pub points: Json<Vec<SpectrumPoint>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A detail with its snapshot and spectra.
#[derive(Debug, Clone, Serialize)]
pub struct DetailWithChildren {
    #[serde(flatten)]
    pub detail: AnnotationDetail,
    pub mode_snapshot: Option<DetailModeSnapshot>,
    pub spectra: Vec<AnnotationSpectrum>,
}

/// A sample with its complete annotation subtree, details in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct SampleWithAnnotations {
    #[serde(flatten)]
    pub sample: Sample,
    pub annotations: Vec<DetailWithChildren>,
}
