//! Sample entity and its mutation payloads.

use serde::{Deserialize, Serialize};

use super::{string_or_number, SampleStatus};

/// A quality-control sample as the backend returns it.
///
/// Measurement fields are only meaningful once the status has left
/// pending; by convention they are populated together with the terminal
/// status transition, but nothing stops a pending sample from carrying
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: i64,
    pub sample_code: String,
    pub production_id: i64,
    pub sample_type_id: i64,
    pub status: SampleStatus,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub water_absorption: Option<f64>,
    #[serde(default)]
    pub breaking_strength: Option<f64>,
    #[serde(default)]
    pub test_results: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Registration payload for `POST /sample/samples`.
///
/// Status is always pending here; measurement fields do not exist at
/// intake. Optional intake fields are serialized as explicit nulls to
/// match what the backend expects.
#[derive(Debug, Clone, Serialize)]
pub struct NewSample {
    pub sample_code: String,
    pub production_id: i64,
    pub sample_type_id: i64,
    pub status: SampleStatus,
    pub created_by: String,
    pub storage_location: Option<String>,
    pub note: Option<String>,
}

/// Full-replace result payload for `PUT /sample/samples/:id`.
///
/// Every field is serialized on every submission; measurements the caller
/// leaves out reach the backend as explicit nulls rather than keeping
/// their previous values. Callers must re-send anything they want kept.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleResult {
    pub status: SampleStatus,
    pub dimensions: Option<String>,
    pub colour: Option<String>,
    pub weight: Option<f64>,
    pub water_absorption: Option<f64>,
    pub breaking_strength: Option<f64>,
    pub test_results: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_payload_shape() {
        let sample = NewSample {
            sample_code: "SAMP-2025-001".into(),
            production_id: 3,
            sample_type_id: 2,
            status: SampleStatus::Pending,
            created_by: "tech7".into(),
            storage_location: None,
            note: None,
        };

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["sample_code"], "SAMP-2025-001");
        // Optional intake fields go out as explicit nulls.
        assert!(json["storage_location"].is_null());
        assert!(json["note"].is_null());
    }

    #[test]
    fn test_result_payload_is_full_replace() {
        let result = SampleResult {
            status: SampleStatus::Completed,
            weight: Some(12.5),
            ..Default::default()
        };

        let json = serde_json::to_value(&result).unwrap();
        let object = json.as_object().unwrap();

        // Every measurement key is present on every submission.
        for key in [
            "dimensions",
            "colour",
            "weight",
            "water_absorption",
            "breaking_strength",
            "test_results",
        ] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(json["status"], "completed");
        assert_eq!(json["weight"], 12.5);
        assert!(json["dimensions"].is_null());
        assert!(json["breaking_strength"].is_null());
    }

    #[test]
    fn test_sample_tolerates_missing_optionals() {
        let sample: Sample = serde_json::from_str(
            r#"{
                "sample_id": 9,
                "sample_code": "SAMP-2025-009",
                "production_id": 1,
                "sample_type_id": 2,
                "status": "Tested",
                "created_by": 42
            }"#,
        )
        .unwrap();

        assert_eq!(sample.status, SampleStatus::Completed);
        assert_eq!(sample.created_by, "42");
        assert!(sample.weight.is_none());
        assert!(sample.note.is_none());
    }
}
