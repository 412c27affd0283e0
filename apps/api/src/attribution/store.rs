//! Campaign data access: read views for scoring plus the append-only
//! attribution result log.

use anyhow::Result;
use sqlx::PgPool;

use crate::models::attribution::AttributionResultRow;
use crate::models::campaign::CampaignRow;
use crate::models::event::{AiringRow, ConversionEventRow};

/// Channels that carry explicit attribution tags. Conversions from any
/// other source are candidates for TV inference.
pub const TRACKED_SOURCES: &[&str] = &[
    "instagram", "whatsapp", "email", "call", "promo", "qr", "app",
];

/// Source labels that mark a conversion as unattributed. A NULL source
/// qualifies as well; matching is case-insensitive.
pub const UNATTRIBUTED_SOURCES: &[&str] = &["direct", "unknown"];

/// Conversion totals for one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCounts {
    pub total: i64,
    pub measured: i64,
}

pub async fn load_campaign(pool: &PgPool, campaign_id: &str) -> Result<Option<CampaignRow>> {
    let campaign = sqlx::query_as::<_, CampaignRow>(
        "SELECT * FROM campaigns WHERE campaign_id = $1",
    )
    .bind(campaign_id)
    .fetch_optional(pool)
    .await?;

    Ok(campaign)
}

/// Total conversion events and the tracked-source subset for one campaign.
pub async fn load_event_counts(pool: &PgPool, campaign_id: &str) -> Result<EventCounts> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events WHERE campaign_id = $1 AND event_type = 'conversion'",
    )
    .bind(campaign_id)
    .fetch_one(pool)
    .await?;

    let tracked: Vec<String> = TRACKED_SOURCES.iter().map(|s| s.to_string()).collect();
    let measured: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM events
        WHERE campaign_id = $1 AND event_type = 'conversion'
          AND LOWER(source) = ANY($2)
        "#,
    )
    .bind(campaign_id)
    .bind(&tracked)
    .fetch_one(pool)
    .await?;

    Ok(EventCounts { total, measured })
}

/// Conversion rows with no tracked source: NULL, direct, or unknown.
pub async fn load_unattributed_events(
    pool: &PgPool,
    campaign_id: &str,
) -> Result<Vec<ConversionEventRow>> {
    let markers: Vec<String> = UNATTRIBUTED_SOURCES.iter().map(|s| s.to_string()).collect();
    let events = sqlx::query_as::<_, ConversionEventRow>(
        r#"
        SELECT * FROM events
        WHERE campaign_id = $1 AND event_type = 'conversion'
          AND (source IS NULL OR LOWER(source) = ANY($2))
        "#,
    )
    .bind(campaign_id)
    .bind(&markers)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

pub async fn load_airings(pool: &PgPool, campaign_id: &str) -> Result<Vec<AiringRow>> {
    let airings = sqlx::query_as::<_, AiringRow>(
        "SELECT * FROM airings WHERE campaign_id = $1",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(airings)
}

/// Campaign-wide promo signal: a promo source or a `tv_code` referrer,
/// regardless of whether the row is otherwise attributed.
pub async fn count_promo_tagged(pool: &PgPool, campaign_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM events
        WHERE campaign_id = $1 AND event_type = 'conversion'
          AND (LOWER(source) = 'promo' OR LOWER(referrer) LIKE '%tv_code%')
        "#,
    )
    .bind(campaign_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Appends one computed result to the campaign's history.
///
/// CRITICAL: attribution_results is append-only. Never UPDATE existing
/// rows; every computation is its own historical record, so reruns with
/// identical inputs append identical rows rather than overwriting.
pub async fn append_result(pool: &PgPool, result: &AttributionResultRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO attribution_results
            (id, campaign_id, window_start, window_end, total_conversions,
             measured_conversions, unattributed, scores, weights,
             overall_score, inferred_tv, confidence, computed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(result.id)
    .bind(&result.campaign_id)
    .bind(result.window_start)
    .bind(result.window_end)
    .bind(result.total_conversions)
    .bind(result.measured_conversions)
    .bind(result.unattributed)
    .bind(&result.scores)
    .bind(&result.weights)
    .bind(result.overall_score)
    .bind(result.inferred_tv)
    .bind(result.confidence)
    .bind(result.computed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Full result history for a campaign, newest first.
pub async fn list_results(pool: &PgPool, campaign_id: &str) -> Result<Vec<AttributionResultRow>> {
    let results = sqlx::query_as::<_, AttributionResultRow>(
        "SELECT * FROM attribution_results WHERE campaign_id = $1 ORDER BY computed_at DESC",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(results)
}
