use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One appended attribution computation.
///
/// `scores`, `weights`, and `overall_score` are present only when the
/// campaign had unattributed conversions to score; the fully-measured
/// short-circuit omits them entirely rather than emitting empty maps.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttributionResultRow {
    pub id: Uuid,
    pub campaign_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total_conversions: i64,
    pub measured_conversions: i64,
    pub unattributed: i64,
    /// Per-signal scores keyed by scorer name, rounded to 3 decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Value>,
    /// Renormalized weights keyed by scorer name, rounded to 3 decimals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    pub inferred_tv: f64,
    pub confidence: f64,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_result(scores: Option<Value>) -> AttributionResultRow {
        AttributionResultRow {
            id: Uuid::new_v4(),
            campaign_id: "camp_001".to_string(),
            window_start: Utc::now(),
            window_end: Utc::now(),
            total_conversions: 90,
            measured_conversions: 90,
            unattributed: 0,
            weights: scores.clone(),
            scores,
            overall_score: None,
            inferred_tv: 0.0,
            confidence: 1.0,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_short_circuit_result_omits_score_keys() {
        let serialized = serde_json::to_value(make_result(None)).unwrap();
        let object = serialized.as_object().unwrap();
        assert!(!object.contains_key("scores"));
        assert!(!object.contains_key("weights"));
        assert!(!object.contains_key("overall_score"));
        assert_eq!(object["unattributed"], json!(0));
        assert_eq!(object["inferred_tv"], json!(0.0));
        assert_eq!(object["confidence"], json!(1.0));
    }

    #[test]
    fn test_scored_result_keeps_score_keys() {
        let serialized =
            serde_json::to_value(make_result(Some(json!({ "time_score": 0.714 })))).unwrap();
        assert_eq!(serialized["scores"]["time_score"], json!(0.714));
    }

    #[test]
    fn test_deserialize_tolerates_missing_score_keys() {
        let raw = json!({
            "id": "7f1c3cb2-07a5-4f0e-9f64-57b3a54b0a2c",
            "campaign_id": "camp_001",
            "window_start": "2025-11-01T00:00:00Z",
            "window_end": "2025-11-07T00:00:00Z",
            "total_conversions": 90,
            "measured_conversions": 90,
            "unattributed": 0,
            "inferred_tv": 0.0,
            "confidence": 1.0,
            "computed_at": "2025-11-08T12:00:00Z"
        });
        let row: AttributionResultRow = serde_json::from_value(raw).unwrap();
        assert!(row.scores.is_none());
        assert!(row.overall_score.is_none());
    }
}
