//! Partial-signal scorers.
//!
//! None of the tracked channels can see a TV spot drive a conversion, so
//! the pipeline blends weak signals instead: temporal proximity to
//! airings, geographic overlap, absent referrers, and promo/QR tagging.
//! Each signal lives behind [`SignalScorer`] so new evidence (a real
//! uplift model, say) slots in without touching the combiner.

use std::collections::HashSet;

use chrono::Duration;

use crate::models::event::{AiringRow, ConversionEventRow};

/// Read-only view of one campaign's scoring inputs for a single run.
pub struct SignalInputs<'a> {
    /// Conversions with no tracked source. Drives every per-event ratio.
    pub unattributed: &'a [ConversionEventRow],
    pub airings: &'a [AiringRow],
    /// Campaign-wide count of promo-tagged conversions (promo source or a
    /// `tv_code` referrer). Deliberately not restricted to the
    /// unattributed set, so the ratio is capped at 1.0 where used.
    pub promo_tagged: i64,
}

impl SignalInputs<'_> {
    /// Ratio denominator with a floor of 1. An empty unattributed set is
    /// short-circuited upstream, but a zero denominator must never panic
    /// or produce NaN here regardless.
    fn unit_denominator(&self) -> f64 {
        self.unattributed.len().max(1) as f64
    }
}

/// One weak TV-exposure signal.
///
/// Implementations are carried as `Box<dyn SignalScorer>` and must return
/// a score in [0, 1]. Inactive scorers stay registered (their name still
/// appears in emitted maps) but score 0.0 and surrender their weight to
/// the active ones.
pub trait SignalScorer: Send + Sync {
    /// Stable key used in the persisted scores/weights maps.
    fn name(&self) -> &'static str;

    /// Weight before renormalization across active scorers.
    fn base_weight(&self) -> f64;

    fn active(&self) -> bool {
        true
    }

    fn compute(&self, inputs: &SignalInputs<'_>) -> f64;
}

// ────────────────────────────────────────────────────────────────────────
// Temporal proximity
// ────────────────────────────────────────────────────────────────────────

/// Fraction of unattributed conversions that landed inside the trailing
/// window after at least one airing.
pub struct TemporalProximityScorer {
    window_hours: i64,
}

impl TemporalProximityScorer {
    pub fn new(window_hours: i64) -> Self {
        Self { window_hours }
    }
}

impl SignalScorer for TemporalProximityScorer {
    fn name(&self) -> &'static str {
        "time_score"
    }

    fn base_weight(&self) -> f64 {
        0.30
    }

    fn compute(&self, inputs: &SignalInputs<'_>) -> f64 {
        // Windows chrono cannot represent match nothing; the plain
        // Duration::hours constructor would panic on them.
        let window = match Duration::try_hours(self.window_hours) {
            Some(window) => window,
            None => return 0.0,
        };

        let airing_times: Vec<_> = inputs
            .airings
            .iter()
            .filter_map(AiringRow::aired_at)
            .collect();

        // A conversion counts once no matter how many airings it trails.
        // Events before every airing (negative delta) never match.
        let matched = inputs
            .unattributed
            .iter()
            .filter_map(ConversionEventRow::occurred_at)
            .filter(|&event_time| {
                airing_times.iter().any(|&airing_time| {
                    let delta = event_time - airing_time;
                    delta >= Duration::zero() && delta <= window
                })
            })
            .count();

        matched as f64 / inputs.unit_denominator()
    }
}

// ────────────────────────────────────────────────────────────────────────
// Geographic overlap
// ────────────────────────────────────────────────────────────────────────

/// Fraction of unattributed conversions whose recorded region is one the
/// campaign aired in. Region labels compare verbatim; normalization is an
/// ingestion concern.
pub struct GeoOverlapScorer;

impl SignalScorer for GeoOverlapScorer {
    fn name(&self) -> &'static str {
        "geo_score"
    }

    fn base_weight(&self) -> f64 {
        0.20
    }

    fn compute(&self, inputs: &SignalInputs<'_>) -> f64 {
        let airing_regions: HashSet<&str> = inputs
            .airings
            .iter()
            .filter_map(|airing| airing.region.as_deref())
            .collect();

        let matched = inputs
            .unattributed
            .iter()
            .filter(|event| {
                event
                    .geo
                    .as_deref()
                    .map(|geo| airing_regions.contains(geo))
                    .unwrap_or(false)
            })
            .count();

        matched as f64 / inputs.unit_denominator()
    }
}

// ────────────────────────────────────────────────────────────────────────
// Direct traffic
// ────────────────────────────────────────────────────────────────────────

/// Fraction of unattributed conversions that arrived with no referrer at
/// all. Nothing else claims credit for these, which is weak evidence of an
/// offline prompt.
pub struct DirectTrafficScorer;

impl SignalScorer for DirectTrafficScorer {
    fn name(&self) -> &'static str {
        "direct_score"
    }

    fn base_weight(&self) -> f64 {
        0.15
    }

    fn compute(&self, inputs: &SignalInputs<'_>) -> f64 {
        let matched = inputs
            .unattributed
            .iter()
            .filter(|event| event.referrer.as_deref().unwrap_or("").is_empty())
            .count();

        matched as f64 / inputs.unit_denominator()
    }
}

// ────────────────────────────────────────────────────────────────────────
// Promo / QR codes
// ────────────────────────────────────────────────────────────────────────

/// Campaign-wide promo-tagged conversions scaled against the unattributed
/// set. The numerator spans the whole campaign, so the ratio is capped at
/// 1.0.
pub struct PromoCodeScorer;

impl SignalScorer for PromoCodeScorer {
    fn name(&self) -> &'static str {
        "promo_score"
    }

    fn base_weight(&self) -> f64 {
        0.25
    }

    fn compute(&self, inputs: &SignalInputs<'_>) -> f64 {
        (inputs.promo_tagged as f64 / inputs.unit_denominator()).min(1.0)
    }
}

// ────────────────────────────────────────────────────────────────────────
// Uplift (reserved)
// ────────────────────────────────────────────────────────────────────────

/// Reserved slot for incremental-lift modeling: comparing conversion rates
/// in matched pre/post-airing windows. Inactive until a baseline window
/// definition exists, so the combiner redistributes its weight.
pub struct UpliftScorer;

impl SignalScorer for UpliftScorer {
    fn name(&self) -> &'static str {
        "uplift_score"
    }

    fn base_weight(&self) -> f64 {
        0.10
    }

    fn active(&self) -> bool {
        false
    }

    fn compute(&self, _inputs: &SignalInputs<'_>) -> f64 {
        0.0
    }
}

/// The standard signal set. Base weights sum to 1.0 before the inactive
/// uplift slot is redistributed.
pub fn default_scorers(window_hours: i64) -> Vec<Box<dyn SignalScorer>> {
    vec![
        Box::new(TemporalProximityScorer::new(window_hours)),
        Box::new(GeoOverlapScorer),
        Box::new(DirectTrafficScorer),
        Box::new(PromoCodeScorer),
        Box::new(UpliftScorer),
    ]
}
