//! Attribution pipeline: one scoring run end to end.
//!
//! Flow: count conversions, short-circuit if everything is measured,
//! otherwise score the unattributed set through the signal chain, append
//! the result to the campaign's history, and fan the summary out to the
//! alert channels. Alert delivery is best-effort; persistence is not.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::attribution::combiner::combine_signals;
use crate::attribution::signals::{default_scorers, SignalInputs};
use crate::attribution::store::{self, EventCounts};
use crate::errors::AppError;
use crate::models::attribution::AttributionResultRow;
use crate::models::campaign::CampaignRow;
use crate::models::event::parse_timestamp;
use crate::notify::Notifier;

/// Trailing airing window used when the caller does not override it.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Runs one attribution computation for a campaign and appends the result.
///
/// An unknown campaign id is not an error: it simply has zero events and
/// takes the fully-measured short-circuit, which keeps the endpoint
/// idempotent for campaigns whose events arrive later.
pub async fn compute_attribution(
    pool: &PgPool,
    notifier: &Notifier,
    campaign_id: &str,
    window_hours: i64,
) -> Result<AttributionResultRow, AppError> {
    // 1. Conversion totals
    let counts = store::load_event_counts(pool, campaign_id)
        .await
        .map_err(AppError::Internal)?;
    let unattributed = unattributed_count(&counts);
    info!(
        "Campaign {campaign_id}: {} conversions ({} measured, {} unattributed)",
        counts.total, counts.measured, unattributed
    );

    // 2. Signal scoring, unless the tracked channels explain everything
    let outcome = if unattributed > 0 {
        let events = store::load_unattributed_events(pool, campaign_id)
            .await
            .map_err(AppError::Internal)?;
        let airings = store::load_airings(pool, campaign_id)
            .await
            .map_err(AppError::Internal)?;
        let promo_tagged = store::count_promo_tagged(pool, campaign_id)
            .await
            .map_err(AppError::Internal)?;
        info!(
            "Scoring {} unattributed rows against {} airings (promo_tagged={promo_tagged})",
            events.len(),
            airings.len()
        );

        let inputs = SignalInputs {
            unattributed: &events,
            airings: &airings,
            promo_tagged,
        };
        Some(combine_signals(
            &default_scorers(window_hours),
            &inputs,
            unattributed,
            counts.measured,
        ))
    } else {
        info!("Campaign {campaign_id} fully measured; skipping signal scoring");
        None
    };

    // 3. Reporting window from the campaign record (if any)
    let campaign = store::load_campaign(pool, campaign_id)
        .await
        .map_err(AppError::Internal)?;
    let (window_start, window_end) = resolve_window(campaign.as_ref());

    // 4. Package the result row
    let (scores, weights, overall_score, inferred_tv, confidence) = match outcome {
        Some(outcome) => {
            let scores = serde_json::to_value(&outcome.scores).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to serialize scores: {e}"))
            })?;
            let weights = serde_json::to_value(&outcome.weights).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to serialize weights: {e}"))
            })?;
            (
                Some(scores),
                Some(weights),
                Some(outcome.overall),
                outcome.inferred_tv,
                outcome.confidence,
            )
        }
        // Fully measured: nothing left to infer, and we are certain of it.
        None => (None, None, None, 0.0, 1.0),
    };

    let result = AttributionResultRow {
        id: Uuid::new_v4(),
        campaign_id: campaign_id.to_string(),
        window_start,
        window_end,
        total_conversions: counts.total,
        measured_conversions: counts.measured,
        unattributed,
        scores,
        weights,
        overall_score,
        inferred_tv,
        confidence,
        computed_at: Utc::now(),
    };

    // 5. Append to history. A storage failure fails the invocation: a
    // result that was never recorded must not be reported as computed.
    store::append_result(pool, &result)
        .await
        .map_err(AppError::Internal)?;
    info!("Appended attribution result {} for campaign {campaign_id}", result.id);

    // 6. Alert fan-out, after persistence succeeded
    notifier.notify(&summary_line(&result)).await;

    Ok(result)
}

/// Unattributed conversions by count delta, clamped at zero: tracked
/// sources can exceed the total when upstream trackers double-tag events.
fn unattributed_count(counts: &EventCounts) -> i64 {
    (counts.total - counts.measured).max(0)
}

/// Reporting window for the emitted result: the campaign's configured
/// dates where they parse, otherwise the trailing seven days.
pub fn resolve_window(campaign: Option<&CampaignRow>) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let start = campaign
        .and_then(|c| c.start_date.as_deref())
        .and_then(parse_timestamp)
        .unwrap_or_else(|| now - Duration::days(7));
    let end = campaign
        .and_then(|c| c.end_date.as_deref())
        .and_then(parse_timestamp)
        .unwrap_or(now);
    (start, end)
}

/// One-line summary forwarded to the alert channels.
pub fn summary_line(result: &AttributionResultRow) -> String {
    format!(
        "Inferred TV conversions: {} (confidence {:.2})",
        result.inferred_tv, result.confidence
    )
}
