//! Sample entity model and DTOs.

use hyperlabel_core::datasource::ScannedSample;
use hyperlabel_core::sample::SampleType;
use hyperlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `samples` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sample {
    pub id: DbId,
    pub project_id: DbId,
    pub external_id: String,
    pub sample_type: String,
    pub source_files: Vec<String>,
    pub status: String,
    pub is_annotated: bool,
    pub last_annotated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Sample {
    /// Parsed sample type.
    ///
    /// Anything other than `hyperspectral` reads as an image, so an
    /// unexpected tag can never unlock hyperspectral-only data.
    pub fn kind(&self) -> SampleType {
        match SampleType::from_str(&self.sample_type) {
            Ok(SampleType::Hyperspectral) => SampleType::Hyperspectral,
            _ => SampleType::Image,
        }
    }
}

/// DTO for inserting a sample discovered by a folder scan.
#[derive(Debug, Clone)]
pub struct CreateSample {
    pub sample_type: SampleType,
    pub source_files: Vec<String>,
}

impl From<ScannedSample> for CreateSample {
    fn from(scanned: ScannedSample) -> Self {
        Self {
            sample_type: scanned.sample_type,
            source_files: scanned.files,
        }
    }
}
