//! Sample type and status vocabularies.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Kind of data a sample was imported from.
///
/// Fixed at import time. Only hyperspectral samples carry meaningful mode
/// snapshots and spectrum curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    Image,
    Hyperspectral,
}

impl SampleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Hyperspectral => "hyperspectral",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "image" => Ok(Self::Image),
            "hyperspectral" => Ok(Self::Hyperspectral),
            _ => Err(CoreError::Validation(format!(
                "Invalid sample type '{s}'. Must be one of: image, hyperspectral"
            ))),
        }
    }

    pub fn is_hyperspectral(&self) -> bool {
        matches!(self, Self::Hyperspectral)
    }
}

/// Whether a sample counts towards the project's available samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Valid,
    Ignored,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Ignored => "ignored",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "valid" => Ok(Self::Valid),
            "ignored" => Ok(Self::Ignored),
            _ => Err(CoreError::Validation(format!(
                "Invalid sample status '{s}'. Must be one of: valid, ignored"
            ))),
        }
    }
}

/// Request to change a sample's status, optionally overriding its
/// annotated flag at the same time.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleStatusUpdate {
    pub status: SampleStatus,
    pub is_annotated: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sample_type_round_trips_through_str() {
        for t in [SampleType::Image, SampleType::Hyperspectral] {
            assert_eq!(SampleType::from_str(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_sample_type_rejected() {
        assert_matches!(SampleType::from_str("video"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn only_hyperspectral_is_hyperspectral() {
        assert!(SampleType::Hyperspectral.is_hyperspectral());
        assert!(!SampleType::Image.is_hyperspectral());
    }

    #[test]
    fn sample_status_parses_known_values() {
        assert_eq!(SampleStatus::from_str("valid").unwrap(), SampleStatus::Valid);
        assert_eq!(SampleStatus::from_str("ignored").unwrap(), SampleStatus::Ignored);
        assert!(SampleStatus::from_str("deleted").is_err());
    }

    #[test]
    fn status_update_deserializes_without_override() {
        let update: SampleStatusUpdate =
            serde_json::from_value(serde_json::json!({"status": "ignored"})).unwrap();
        assert_eq!(update.status, SampleStatus::Ignored);
        assert!(update.is_annotated.is_none());
    }
}
