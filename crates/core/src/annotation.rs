//! Annotation payload types and validation.
//!
//! A replace request carries the complete annotation set for one sample.
//! Everything here is checked before the database is touched, so a rejected
//! payload never leaves a partially rewritten sample behind.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower bound for a per-channel display gain.
pub const MIN_GAIN: f64 = -4096.0;

/// Upper bound for a per-channel display gain.
pub const MAX_GAIN: f64 = 4096.0;

/// Maximum length of a label name.
pub const MAX_LABEL_NAME_LENGTH: u64 = 255;

// ---------------------------------------------------------------------------
// Tool types
// ---------------------------------------------------------------------------

/// Drawing tool that produced an annotation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Rect,
    Polygon,
    Point,
    Circle,
    Line,
    Grid,
}

const VALID_TOOL_STRINGS: &[&str] = &["rect", "polygon", "point", "circle", "line", "grid"];

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Polygon => "polygon",
            Self::Point => "point",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Grid => "grid",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "rect" => Ok(Self::Rect),
            "polygon" => Ok(Self::Polygon),
            "point" => Ok(Self::Point),
            "circle" => Ok(Self::Circle),
            "line" => Ok(Self::Line),
            "grid" => Ok(Self::Grid),
            _ => Err(CoreError::Validation(format!(
                "Invalid tool type '{s}'. Must be one of: {}",
                VALID_TOOL_STRINGS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One wavelength/intensity sample of a spectrum curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub wavelength: f64,
    pub intensity: f64,
}

/// Spectrum curve attached to a detail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpectrumInput {
    /// Spatial position the curve was sampled at (opaque to the backend).
    pub position: Option<serde_json::Value>,
    #[serde(default)]
    pub points: Vec<SpectrumPoint>,
}

/// Display settings in effect when a detail was drawn.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModeSnapshotInput {
    #[validate(range(min = 0))]
    pub r_channel: i32,
    #[validate(range(min = 0))]
    pub g_channel: i32,
    #[validate(range(min = 0))]
    pub b_channel: i32,
    #[validate(range(min = MIN_GAIN, max = MAX_GAIN))]
    pub r_gain: f64,
    #[validate(range(min = MIN_GAIN, max = MAX_GAIN))]
    pub g_gain: f64,
    #[validate(range(min = MIN_GAIN, max = MAX_GAIN))]
    pub b_gain: f64,
    /// Gain algorithm code. Unknown or missing codes fall back to the default.
    #[serde(default)]
    pub gain_algorithm: Option<String>,
    #[serde(default)]
    pub dark_calibration: bool,
    #[serde(default)]
    pub white_calibration: bool,
}

/// One annotation detail as submitted by the annotation UI.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnnotationInput {
    #[validate(length(min = 1, max = MAX_LABEL_NAME_LENGTH))]
    pub label_name: String,
    #[validate(custom(function = "validate_color_field"))]
    pub color: String,
    pub tool_type: ToolType,
    /// Tool-specific geometry. Must be a JSON object.
    pub coordinates: serde_json::Value,
    pub radius: Option<f64>,
    pub area: Option<f64>,
    pub confidence: Option<f64>,
    pub remark: Option<String>,
    #[validate(nested)]
    pub mode_snapshot: Option<ModeSnapshotInput>,
    #[serde(default)]
    pub spectra: Option<Vec<SpectrumInput>>,
}

/// Full replacement annotation set for one sample.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceAnnotations {
    #[serde(default)]
    #[validate(nested)]
    pub annotations: Vec<AnnotationInput>,
    #[serde(default = "default_mark_annotated")]
    pub mark_annotated: bool,
}

fn default_mark_annotated() -> bool {
    true
}

impl ReplaceAnnotations {
    /// The sample's `is_annotated` flag after this payload is applied.
    ///
    /// Annotated status requires actual content: marking an empty set as
    /// annotated still yields `false`.
    pub fn resulting_annotated_flag(&self) -> bool {
        self.mark_annotated && !self.annotations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate that a color string matches `#RRGGBB` or `#RRGGBBAA` hex format.
pub fn validate_color_hex(color: &str) -> Result<(), CoreError> {
    let valid_length = color.len() == 7 || color.len() == 9;
    if !valid_length || !color.starts_with('#') {
        return Err(CoreError::Validation(format!(
            "color must be in #RRGGBB or #RRGGBBAA format, got '{color}'"
        )));
    }
    if !color[1..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "color contains non-hex characters: '{color}'"
        )));
    }
    Ok(())
}

fn validate_color_field(color: &str) -> Result<(), ValidationError> {
    validate_color_hex(color).map_err(|_| ValidationError::new("color_hex"))
}

fn ensure_finite(field: &str, index: usize, value: Option<f64>) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.is_finite() => Err(CoreError::Validation(format!(
            "annotations[{index}].{field} must be a finite number"
        ))),
        _ => Ok(()),
    }
}

/// Validate a replace payload in full.
///
/// Runs the declarative field rules and then the checks they cannot express:
/// coordinates must be a JSON object and every float must be finite.
pub fn validate_replace_payload(payload: &ReplaceAnnotations) -> Result<(), CoreError> {
    payload.validate()?;

    for (i, detail) in payload.annotations.iter().enumerate() {
        if !detail.coordinates.is_object() {
            return Err(CoreError::Validation(format!(
                "annotations[{i}].coordinates must be a JSON object"
            )));
        }

        ensure_finite("radius", i, detail.radius)?;
        ensure_finite("area", i, detail.area)?;
        ensure_finite("confidence", i, detail.confidence)?;

        if let Some(mode) = &detail.mode_snapshot {
            for (name, gain) in [
                ("r_gain", mode.r_gain),
                ("g_gain", mode.g_gain),
                ("b_gain", mode.b_gain),
            ] {
                if !gain.is_finite() {
                    return Err(CoreError::Validation(format!(
                        "annotations[{i}].mode_snapshot.{name} must be a finite number"
                    )));
                }
            }
        }

        for (j, spectrum) in detail.spectra.iter().flatten().enumerate() {
            let bad_point = spectrum
                .points
                .iter()
                .any(|p| !p.wavelength.is_finite() || !p.intensity.is_finite());
            if bad_point {
                return Err(CoreError::Validation(format!(
                    "annotations[{i}].spectra[{j}] contains a non-finite point"
                )));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn detail(value: serde_json::Value) -> AnnotationInput {
        serde_json::from_value(value).unwrap()
    }

    fn rect() -> serde_json::Value {
        json!({
            "label_name": "leaf",
            "color": "#22AA44",
            "tool_type": "rect",
            "coordinates": {"x": 1, "y": 2, "width": 10, "height": 12}
        })
    }

    fn payload(annotations: Vec<AnnotationInput>) -> ReplaceAnnotations {
        ReplaceAnnotations {
            annotations,
            mark_annotated: true,
        }
    }

    // -- tool types --------------------------------------------------------

    #[test]
    fn tool_type_round_trips() {
        for s in VALID_TOOL_STRINGS {
            assert_eq!(ToolType::from_str(s).unwrap().as_str(), *s);
        }
    }

    #[test]
    fn unknown_tool_type_rejected() {
        assert_matches!(ToolType::from_str("lasso"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn unknown_tool_type_fails_deserialization() {
        let mut value = rect();
        value["tool_type"] = json!("lasso");
        assert!(serde_json::from_value::<AnnotationInput>(value).is_err());
    }

    // -- payload defaults --------------------------------------------------

    #[test]
    fn mark_annotated_defaults_to_true() {
        let p: ReplaceAnnotations = serde_json::from_value(json!({"annotations": []})).unwrap();
        assert!(p.mark_annotated);
        assert!(p.annotations.is_empty());
    }

    #[test]
    fn empty_payload_is_never_annotated() {
        let p = payload(vec![]);
        assert!(!p.resulting_annotated_flag());
    }

    #[test]
    fn non_empty_payload_follows_mark_request() {
        let mut p = payload(vec![detail(rect())]);
        assert!(p.resulting_annotated_flag());
        p.mark_annotated = false;
        assert!(!p.resulting_annotated_flag());
    }

    #[test]
    fn mode_snapshot_algorithm_is_optional() {
        let mut value = rect();
        value["mode_snapshot"] = json!({
            "r_channel": 10, "g_channel": 20, "b_channel": 30,
            "r_gain": 1.0, "g_gain": 1.0, "b_gain": 1.0
        });
        let d = detail(value);
        let mode = d.mode_snapshot.unwrap();
        assert!(mode.gain_algorithm.is_none());
        assert!(!mode.dark_calibration);
    }

    // -- validate_color_hex ------------------------------------------------

    #[test]
    fn color_hex_accepts_both_formats() {
        assert!(validate_color_hex("#FF4444").is_ok());
        assert!(validate_color_hex("#ff444480").is_ok());
    }

    #[test]
    fn color_hex_rejects_malformed() {
        assert!(validate_color_hex("FF4444").is_err());
        assert!(validate_color_hex("#F44").is_err());
        assert!(validate_color_hex("#GGGGGG").is_err());
        assert!(validate_color_hex("").is_err());
    }

    // -- validate_replace_payload ------------------------------------------

    #[test]
    fn valid_payload_passes() {
        let mut value = rect();
        value["mode_snapshot"] = json!({
            "r_channel": 10, "g_channel": 20, "b_channel": 30,
            "r_gain": -4096.0, "g_gain": 1.5, "b_gain": 4096.0,
            "gain_algorithm": "gamma"
        });
        value["spectra"] = json!([
            {"position": {"x": 3, "y": 4}, "points": [{"wavelength": 400.0, "intensity": 0.2}]}
        ]);
        assert!(validate_replace_payload(&payload(vec![detail(value)])).is_ok());
    }

    #[test]
    fn empty_payload_passes() {
        assert!(validate_replace_payload(&payload(vec![])).is_ok());
    }

    #[test]
    fn empty_label_rejected() {
        let mut value = rect();
        value["label_name"] = json!("");
        assert_matches!(
            validate_replace_payload(&payload(vec![detail(value)])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn bad_color_rejected() {
        let mut value = rect();
        value["color"] = json!("green");
        assert_matches!(
            validate_replace_payload(&payload(vec![detail(value)])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn out_of_range_gain_rejected() {
        let mut value = rect();
        value["mode_snapshot"] = json!({
            "r_channel": 0, "g_channel": 0, "b_channel": 0,
            "r_gain": 5000.0, "g_gain": 1.0, "b_gain": 1.0
        });
        assert_matches!(
            validate_replace_payload(&payload(vec![detail(value)])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn negative_channel_rejected() {
        let mut value = rect();
        value["mode_snapshot"] = json!({
            "r_channel": -1, "g_channel": 0, "b_channel": 0,
            "r_gain": 1.0, "g_gain": 1.0, "b_gain": 1.0
        });
        assert!(validate_replace_payload(&payload(vec![detail(value)])).is_err());
    }

    #[test]
    fn non_object_coordinates_rejected() {
        let mut value = rect();
        value["coordinates"] = json!([1, 2, 3]);
        let err = validate_replace_payload(&payload(vec![detail(value)])).unwrap_err();
        assert!(err.to_string().contains("coordinates"));
    }

    #[test]
    fn nan_confidence_rejected() {
        let mut d = detail(rect());
        d.confidence = Some(f64::NAN);
        assert!(validate_replace_payload(&payload(vec![d])).is_err());
    }

    #[test]
    fn non_finite_spectrum_point_rejected() {
        let mut d = detail(rect());
        d.spectra = Some(vec![SpectrumInput {
            position: None,
            points: vec![SpectrumPoint {
                wavelength: f64::INFINITY,
                intensity: 1.0,
            }],
        }]);
        let err = validate_replace_payload(&payload(vec![d])).unwrap_err();
        assert!(err.to_string().contains("spectra[0]"));
    }
}
