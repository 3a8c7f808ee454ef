#![allow(dead_code)]

use hyperlabel_core::annotation::ReplaceAnnotations;
use hyperlabel_core::project::ProjectPriority;
use hyperlabel_core::sample::SampleType;
use hyperlabel_db::models::project::{CreateProject, Project};
use hyperlabel_db::models::sample::{CreateSample, Sample};
use hyperlabel_db::repositories::{ProjectRepo, SampleRepo};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Insert a project with one sample per entry of `types`, bypassing the
/// folder scan.
pub async fn seed_project(pool: &PgPool, name: &str, types: &[SampleType]) -> (Project, Vec<Sample>) {
    let mut conn = pool.acquire().await.unwrap();
    let project = ProjectRepo::create(
        &mut conn,
        &CreateProject {
            name: name.to_string(),
            priority: ProjectPriority::Normal,
            created_by: None,
        },
    )
    .await
    .unwrap();

    let inputs: Vec<CreateSample> = types
        .iter()
        .enumerate()
        .map(|(i, sample_type)| CreateSample {
            sample_type: *sample_type,
            source_files: vec![format!("{name}/sample_{i}")],
        })
        .collect();
    let samples = SampleRepo::create_many(&mut conn, project.id, &inputs)
        .await
        .unwrap();
    (project, samples)
}

/// A rectangle detail, optionally with a mode snapshot using `gain_algorithm`.
pub fn detail(label: &str, gain_algorithm: Option<&str>) -> Value {
    let mut value = json!({
        "label_name": label,
        "color": "#FF8800",
        "tool_type": "rect",
        "coordinates": {"x": 0, "y": 0, "width": 10, "height": 5},
        "area": 50.0,
    });
    if let Some(code) = gain_algorithm {
        value["mode_snapshot"] = json!({
            "r_channel": 60,
            "g_channel": 40,
            "b_channel": 20,
            "r_gain": 1.2,
            "g_gain": 1.0,
            "b_gain": 0.8,
            "gain_algorithm": code,
            "white_calibration": true,
        });
    }
    value
}

/// Attach spectrum curves with one point per given wavelength.
pub fn with_spectra(mut detail: Value, wavelengths: &[f64]) -> Value {
    let spectra: Vec<Value> = wavelengths
        .iter()
        .map(|w| {
            json!({
                "position": {"x": 3, "y": 4},
                "points": [{"wavelength": w, "intensity": 0.5}],
            })
        })
        .collect();
    detail["spectra"] = Value::Array(spectra);
    detail
}

pub fn payload(details: Vec<Value>) -> ReplaceAnnotations {
    serde_json::from_value(json!({ "annotations": details })).unwrap()
}

pub fn payload_marked(details: Vec<Value>, mark_annotated: bool) -> ReplaceAnnotations {
    serde_json::from_value(json!({
        "annotations": details,
        "mark_annotated": mark_annotated,
    }))
    .unwrap()
}

/// Completion rate recounted straight from the samples table.
pub async fn recount_rate(pool: &PgPool, project_id: i64) -> f64 {
    let (annotated, total): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE is_annotated), COUNT(*)
         FROM samples WHERE project_id = $1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
    .unwrap();
    if total == 0 {
        0.0
    } else {
        (annotated as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    }
}
