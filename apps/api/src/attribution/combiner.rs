//! Score combination.
//!
//! Takes the per-signal scores, renormalizes weights over the active
//! scorers, folds the weighted overall score, and derives the inferred
//! TV conversion count plus a sample-size-damped confidence.

use std::collections::BTreeMap;

use crate::attribution::signals::{SignalInputs, SignalScorer};

/// Confidence saturates once log10(sample_size + 1) reaches this divisor,
/// i.e. at roughly a thousand observed conversions.
const CONFIDENCE_LOG_DIVISOR: f64 = 3.0;

/// Output of one combination pass. All fields are rounded to 3 decimals;
/// derived quantities are computed from the unrounded intermediates first.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineOutcome {
    pub scores: BTreeMap<String, f64>,
    pub weights: BTreeMap<String, f64>,
    pub overall: f64,
    pub inferred_tv: f64,
    pub confidence: f64,
}

/// Redistributes inactive scorers' weight across the active ones so the
/// emitted weights sum to 1.0 whenever anything is active. Inactive
/// scorers keep their map slot with weight 0.0.
pub fn normalized_weights(scorers: &[Box<dyn SignalScorer>]) -> BTreeMap<String, f64> {
    let active_total: f64 = scorers
        .iter()
        .filter(|scorer| scorer.active())
        .map(|scorer| scorer.base_weight())
        .sum();

    scorers
        .iter()
        .map(|scorer| {
            let weight = if scorer.active() && active_total > 0.0 {
                scorer.base_weight() / active_total
            } else {
                0.0
            };
            (scorer.name().to_string(), weight)
        })
        .collect()
}

/// Runs every scorer over `inputs` and folds the weighted overall score.
///
/// Two different "unattributed" quantities feed this on purpose:
/// `unattributed` is the count delta (total - measured) and scales the
/// inferred conversions, while the loaded rows in `inputs` drive the
/// per-event ratios and the confidence sample size. The two can differ
/// when events carry a source label that is neither tracked nor a
/// direct/unknown marker.
pub fn combine_signals(
    scorers: &[Box<dyn SignalScorer>],
    inputs: &SignalInputs<'_>,
    unattributed: i64,
    measured: i64,
) -> CombineOutcome {
    let weights = normalized_weights(scorers);

    let mut scores = BTreeMap::new();
    let mut overall = 0.0;
    for scorer in scorers {
        let value = scorer.compute(inputs);
        let weight = weights.get(scorer.name()).copied().unwrap_or(0.0);
        overall += weight * value;
        scores.insert(scorer.name().to_string(), value);
    }

    let inferred_tv = unattributed as f64 * overall;

    // Larger samples earn confidence slowly: the log factor dampens small
    // campaigns without ever exceeding the overall score itself.
    let sample_size = inputs.unattributed.len() as i64 + measured;
    let confidence_factor =
        (((sample_size + 1) as f64).log10() / CONFIDENCE_LOG_DIVISOR).min(1.0);
    let confidence = overall * confidence_factor;

    CombineOutcome {
        scores: scores.into_iter().map(|(name, v)| (name, round3(v))).collect(),
        weights: weights.into_iter().map(|(name, w)| (name, round3(w))).collect(),
        overall: round3(overall),
        inferred_tv: round3(inferred_tv),
        confidence: round3(confidence),
    }
}

/// Emission precision for scores, weights, and derived quantities.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::signals::default_scorers;
    use crate::models::event::{AiringRow, ConversionEventRow};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    struct StubScorer {
        name: &'static str,
        weight: f64,
        value: f64,
        active: bool,
    }

    impl SignalScorer for StubScorer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn base_weight(&self) -> f64 {
            self.weight
        }

        fn active(&self) -> bool {
            self.active
        }

        fn compute(&self, _inputs: &SignalInputs<'_>) -> f64 {
            self.value
        }
    }

    fn stub(name: &'static str, weight: f64, value: f64, active: bool) -> Box<dyn SignalScorer> {
        Box::new(StubScorer {
            name,
            weight,
            value,
            active,
        })
    }

    fn make_event(timestamp: String, geo: &str) -> ConversionEventRow {
        ConversionEventRow {
            id: Uuid::new_v4(),
            campaign_id: "camp_001".to_string(),
            timestamp,
            event_type: "conversion".to_string(),
            source: Some("direct".to_string()),
            referrer: None,
            geo: Some(geo.to_string()),
            user_id: None,
            revenue: Some(180.0),
        }
    }

    fn empty_inputs<'a>(events: &'a [ConversionEventRow]) -> SignalInputs<'a> {
        SignalInputs {
            unattributed: events,
            airings: &[],
            promo_tagged: 0,
        }
    }

    #[test]
    fn test_default_weights_redistribute_inactive_uplift() {
        let weights = normalized_weights(&default_scorers(24));
        assert!((weights["time_score"] - 0.30 / 0.90).abs() < 1e-9);
        assert!((weights["geo_score"] - 0.20 / 0.90).abs() < 1e-9);
        assert!((weights["direct_score"] - 0.15 / 0.90).abs() < 1e-9);
        assert!((weights["promo_score"] - 0.25 / 0.90).abs() < 1e-9);
        assert_eq!(weights["uplift_score"], 0.0);

        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_inactive_weights_are_zero() {
        let scorers = vec![stub("a", 0.5, 1.0, false), stub("b", 0.5, 1.0, false)];
        let weights = normalized_weights(&scorers);
        assert_eq!(weights["a"], 0.0);
        assert_eq!(weights["b"], 0.0);

        let outcome = combine_signals(&scorers, &empty_inputs(&[]), 10, 0);
        assert_eq!(outcome.overall, 0.0);
        assert_eq!(outcome.inferred_tv, 0.0);
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let scorers = vec![
            stub("a", 0.6, 0.5, true),
            stub("b", 0.2, 1.0, true),
            stub("c", 0.2, 0.0, true),
        ];
        let outcome = combine_signals(&scorers, &empty_inputs(&[]), 0, 0);
        // 0.6*0.5 + 0.2*1.0 + 0.2*0.0 = 0.5
        assert!((outcome.overall - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_inferred_uses_count_delta_not_loaded_rows() {
        let base = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let events = vec![
            make_event(base.to_rfc3339(), "Kolkata"),
            make_event(base.to_rfc3339(), "Kolkata"),
        ];
        let scorers = vec![stub("a", 1.0, 0.5, true)];

        // 5 unattributed by count delta, but only 2 loaded rows.
        let outcome = combine_signals(&scorers, &empty_inputs(&events), 5, 10);
        assert!((outcome.inferred_tv - 2.5).abs() < 0.001);

        // sample_size = 2 loaded + 10 measured = 12.
        let expected_confidence = 0.5 * (13.0_f64.log10() / 3.0);
        assert!((outcome.confidence - round3(expected_confidence)).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_saturates_at_large_samples() {
        let scorers = vec![stub("a", 1.0, 0.8, true)];
        let outcome = combine_signals(&scorers, &empty_inputs(&[]), 3, 5000);
        // log10(5001)/3 > 1, so the factor caps and confidence == overall.
        assert!((outcome.confidence - outcome.overall).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_grows_with_sample_size() {
        let scorers = vec![stub("a", 1.0, 0.8, true)];
        let small = combine_signals(&scorers, &empty_inputs(&[]), 3, 10);
        let large = combine_signals(&scorers, &empty_inputs(&[]), 3, 500);
        assert!(small.confidence < large.confidence);
        assert!(large.confidence <= large.overall + 1e-9);
    }

    #[test]
    fn test_combination_is_deterministic() {
        let scorers = default_scorers(24);
        let events = vec![make_event("2025-11-02T06:00:00Z".to_string(), "Kolkata")];
        let first = combine_signals(&scorers, &empty_inputs(&events), 1, 80);
        let second = combine_signals(&scorers, &empty_inputs(&events), 1, 80);
        assert_eq!(first, second);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(0.5555555), 0.556);
        assert_eq!(round3(1.0), 1.0);
        assert_eq!(round3(0.0004), 0.0);
    }

    // Mirrors the seeded demo campaign: 80 tracked conversions, 10 direct
    // ones (7 in Kolkata shortly after an airing, 3 in Mumbai days later),
    // airings at +23h and +47h in Kolkata, no promo tags.
    #[test]
    fn test_sample_campaign_outcome() {
        let base = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let ts = |hours: i64| (base + Duration::hours(hours)).to_rfc3339();

        let mut events = Vec::new();
        for i in 0..7 {
            events.push(make_event(ts(24 + i), "Kolkata"));
        }
        for i in 0..3 {
            events.push(make_event(ts(100 + i), "Mumbai"));
        }
        let airings = vec![
            AiringRow {
                id: Uuid::new_v4(),
                campaign_id: "camp_001".to_string(),
                airing_time: ts(23),
                channel: Some("ZeeTV".to_string()),
                region: Some("Kolkata".to_string()),
            },
            AiringRow {
                id: Uuid::new_v4(),
                campaign_id: "camp_001".to_string(),
                airing_time: ts(47),
                channel: Some("ZeeTV".to_string()),
                region: Some("Kolkata".to_string()),
            },
        ];
        let inputs = SignalInputs {
            unattributed: &events,
            airings: &airings,
            promo_tagged: 0,
        };

        let outcome = combine_signals(&default_scorers(24), &inputs, 10, 80);

        assert!((outcome.scores["time_score"] - 0.7).abs() < 0.001);
        assert!((outcome.scores["geo_score"] - 0.7).abs() < 0.001);
        assert!((outcome.scores["direct_score"] - 1.0).abs() < 0.001);
        assert_eq!(outcome.scores["promo_score"], 0.0);
        assert_eq!(outcome.scores["uplift_score"], 0.0);

        assert_eq!(outcome.weights["time_score"], 0.333);
        assert_eq!(outcome.weights["geo_score"], 0.222);
        assert_eq!(outcome.weights["direct_score"], 0.167);
        assert_eq!(outcome.weights["promo_score"], 0.278);
        assert_eq!(outcome.weights["uplift_score"], 0.0);

        assert_eq!(outcome.overall, 0.556);
        assert_eq!(outcome.inferred_tv, 5.556);
        // sample_size = 10 + 80; log10(91)/3 ≈ 0.653
        assert_eq!(outcome.confidence, 0.363);
    }
}
