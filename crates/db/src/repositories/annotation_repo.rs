//! Repository for annotation details and their children
//! (`annotation_details`, `annotation_detail_modes`, `annotation_spectra`).

use std::collections::HashMap;

use hyperlabel_core::annotation::{AnnotationInput, ModeSnapshotInput, SpectrumInput};
use hyperlabel_core::types::{new_external_id, DbId};
use sqlx::types::Json;
use sqlx::PgConnection;

use crate::models::annotation::{
    AnnotationDetail, AnnotationSpectrum, DetailModeSnapshot, DetailWithChildren,
};

const DETAIL_COLUMNS: &str = "id, sample_id, external_id, label_name, color, tool_type, \
    coordinates, radius, area, confidence, remark, created_at, updated_at";

const MODE_COLUMNS: &str = "m.id, m.detail_id, m.r_channel, m.g_channel, m.b_channel, \
    m.r_gain, m.g_gain, m.b_gain, m.gain_algorithm_id, a.code AS gain_algorithm, \
    m.dark_calibration, m.white_calibration, m.created_at, m.updated_at";

const SPECTRUM_COLUMNS: &str = "id, detail_id, position, points, created_at, updated_at";

/// Provides write and batched-read operations for annotation trees.
pub struct AnnotationRepo;

impl AnnotationRepo {
    // ── Writes ───────────────────────────────────────────────────────

    /// Delete every detail of a sample. Snapshots and spectra go with them
    /// via `ON DELETE CASCADE`. Returns the number of details removed.
    pub async fn delete_by_sample(
        conn: &mut PgConnection,
        sample_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM annotation_details WHERE sample_id = $1")
            .bind(sample_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert one detail with a freshly generated external identifier.
    pub async fn create_detail(
        conn: &mut PgConnection,
        sample_id: DbId,
        input: &AnnotationInput,
    ) -> Result<AnnotationDetail, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotation_details
                (sample_id, external_id, label_name, color, tool_type, coordinates,
                 radius, area, confidence, remark)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {DETAIL_COLUMNS}"
        );
        sqlx::query_as::<_, AnnotationDetail>(&query)
            .bind(sample_id)
            .bind(new_external_id())
            .bind(&input.label_name)
            .bind(&input.color)
            .bind(input.tool_type.as_str())
            .bind(&input.coordinates)
            .bind(input.radius)
            .bind(input.area)
            .bind(input.confidence)
            .bind(&input.remark)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert the mode snapshot of a detail, referencing an already resolved
    /// algorithm. Returns the new row ID.
    pub async fn create_mode_snapshot(
        conn: &mut PgConnection,
        detail_id: DbId,
        input: &ModeSnapshotInput,
        gain_algorithm_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO annotation_detail_modes
                (detail_id, r_channel, g_channel, b_channel, r_gain, g_gain, b_gain,
                 gain_algorithm_id, dark_calibration, white_calibration)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id",
        )
        .bind(detail_id)
        .bind(input.r_channel)
        .bind(input.g_channel)
        .bind(input.b_channel)
        .bind(input.r_gain)
        .bind(input.g_gain)
        .bind(input.b_gain)
        .bind(gain_algorithm_id)
        .bind(input.dark_calibration)
        .bind(input.white_calibration)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    /// Insert one spectrum curve for a detail. Returns the new row ID.
    pub async fn create_spectrum(
        conn: &mut PgConnection,
        detail_id: DbId,
        input: &SpectrumInput,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO annotation_spectra (detail_id, position, points)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(detail_id)
        .bind(&input.position)
        .bind(Json(&input.points))
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }

    // ── Batched reads ────────────────────────────────────────────────

    /// Details of several samples, grouped by sample and in insertion order.
    pub async fn list_details_for_samples(
        conn: &mut PgConnection,
        sample_ids: &[DbId],
    ) -> Result<Vec<AnnotationDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM annotation_details
             WHERE sample_id = ANY($1)
             ORDER BY sample_id ASC, id ASC"
        );
        sqlx::query_as::<_, AnnotationDetail>(&query)
            .bind(sample_ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Mode snapshots of several details, with their algorithm codes.
    pub async fn list_modes_for_details(
        conn: &mut PgConnection,
        detail_ids: &[DbId],
    ) -> Result<Vec<DetailModeSnapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {MODE_COLUMNS}
             FROM annotation_detail_modes m
             JOIN display_algorithms a ON a.id = m.gain_algorithm_id
             WHERE m.detail_id = ANY($1)"
        );
        sqlx::query_as::<_, DetailModeSnapshot>(&query)
            .bind(detail_ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Spectra of several details, in insertion order.
    pub async fn list_spectra_for_details(
        conn: &mut PgConnection,
        detail_ids: &[DbId],
    ) -> Result<Vec<AnnotationSpectrum>, sqlx::Error> {
        let query = format!(
            "SELECT {SPECTRUM_COLUMNS} FROM annotation_spectra
             WHERE detail_id = ANY($1)
             ORDER BY detail_id ASC, id ASC"
        );
        sqlx::query_as::<_, AnnotationSpectrum>(&query)
            .bind(detail_ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Load the full detail → snapshot → spectra subtree of several samples
    /// in three queries, keyed by sample ID. Samples without details are
    /// absent from the map.
    pub async fn load_trees(
        conn: &mut PgConnection,
        sample_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<DetailWithChildren>>, sqlx::Error> {
        if sample_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let details = Self::list_details_for_samples(conn, sample_ids).await?;
        if details.is_empty() {
            return Ok(HashMap::new());
        }

        let detail_ids: Vec<DbId> = details.iter().map(|d| d.id).collect();
        let modes = Self::list_modes_for_details(conn, &detail_ids).await?;
        let spectra = Self::list_spectra_for_details(conn, &detail_ids).await?;

        let mut modes_by_detail: HashMap<DbId, DetailModeSnapshot> =
            modes.into_iter().map(|m| (m.detail_id, m)).collect();
        let mut spectra_by_detail: HashMap<DbId, Vec<AnnotationSpectrum>> = HashMap::new();
        for spectrum in spectra {
            spectra_by_detail
                .entry(spectrum.detail_id)
                .or_default()
                .push(spectrum);
        }

        let mut trees: HashMap<DbId, Vec<DetailWithChildren>> = HashMap::new();
        for detail in details {
            let node = DetailWithChildren {
                mode_snapshot: modes_by_detail.remove(&detail.id),
                spectra: spectra_by_detail.remove(&detail.id).unwrap_or_default(),
                detail,
            };
            trees.entry(node.detail.sample_id).or_default().push(node);
        }
        Ok(trees)
    }
}
