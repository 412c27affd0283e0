//! Demo data seeding: one sample campaign with a plausible conversion mix
//! so the scoring pipeline can be exercised end to end on a fresh install.

use anyhow::Result;
use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const SAMPLE_CAMPAIGN_ID: &str = "camp_001";

/// POST /api/v1/seed/sample
pub async fn handle_seed_sample(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    seed_sample_campaign(&state.db)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({
        "status": format!("seeded sample campaign {SAMPLE_CAMPAIGN_ID}")
    })))
}

/// Seeds the demo campaign: 80 tracked conversions across four channels,
/// 10 direct ones (7 in Kolkata shortly after an airing, 3 in Mumbai days
/// later), and two Kolkata airings. Re-runnable: the campaign's previous
/// events and airings are wiped first, so repeated seeding does not
/// inflate counts.
pub async fn seed_sample_campaign(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO campaigns (campaign_id, name, start_date, end_date, platforms, tv_regions)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (campaign_id) DO UPDATE SET
            name = EXCLUDED.name,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            platforms = EXCLUDED.platforms,
            tv_regions = EXCLUDED.tv_regions
        "#,
    )
    .bind(SAMPLE_CAMPAIGN_ID)
    .bind("Diwali Promo")
    .bind("2025-11-01")
    .bind("2025-11-07")
    .bind("instagram,whatsapp,email,calls,tv")
    .bind("Kolkata,Delhi")
    .execute(pool)
    .await?;

    sqlx::query("DELETE FROM events WHERE campaign_id = $1")
        .bind(SAMPLE_CAMPAIGN_ID)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM airings WHERE campaign_id = $1")
        .bind(SAMPLE_CAMPAIGN_ID)
        .execute(pool)
        .await?;

    let base = Utc::now();
    let ts = |hours: i64| (base + Duration::hours(hours)).to_rfc3339();

    for i in 0..40 {
        insert_conversion(
            pool,
            &ts(i),
            "instagram",
            Some("instagram.com"),
            "Kolkata",
            &format!("inst_{i}"),
            100.0,
        )
        .await?;
    }
    for i in 0..30 {
        insert_conversion(pool, &ts(i + 1), "whatsapp", None, "Kolkata", &format!("wa_{i}"), 150.0)
            .await?;
    }
    for i in 0..10 {
        insert_conversion(
            pool,
            &ts(i + 2),
            "email",
            Some("campaign_email"),
            "Kolkata",
            &format!("email_{i}"),
            200.0,
        )
        .await?;
    }
    for i in 0..10 {
        insert_conversion(pool, &ts(i + 3), "call", None, "Kolkata", &format!("call_{i}"), 250.0)
            .await?;
    }

    // The interesting part: direct conversions the signals should split.
    // Seven land within a day of the first airing in its region, three sit
    // days later in a region with no airtime.
    for i in 0..7 {
        insert_conversion(pool, &ts(24 + i), "direct", None, "Kolkata", &format!("direct_{i}"), 180.0)
            .await?;
    }
    for i in 0..3 {
        insert_conversion(pool, &ts(100 + i), "direct", None, "Mumbai", &format!("direct2_{i}"), 180.0)
            .await?;
    }

    for hour in [23, 47] {
        sqlx::query(
            r#"
            INSERT INTO airings (id, campaign_id, airing_time, channel, region)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(SAMPLE_CAMPAIGN_ID)
        .bind(ts(hour))
        .bind("ZeeTV")
        .bind("Kolkata")
        .execute(pool)
        .await?;
    }

    info!("Seeded sample campaign {SAMPLE_CAMPAIGN_ID}");
    Ok(())
}

async fn insert_conversion(
    pool: &PgPool,
    timestamp: &str,
    source: &str,
    referrer: Option<&str>,
    geo: &str,
    user_id: &str,
    revenue: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO events (id, campaign_id, timestamp, event_type, source, referrer, geo, user_id, revenue)
        VALUES ($1, $2, $3, 'conversion', $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(SAMPLE_CAMPAIGN_ID)
    .bind(timestamp)
    .bind(source)
    .bind(referrer)
    .bind(geo)
    .bind(user_id)
    .bind(revenue)
    .execute(pool)
    .await?;

    Ok(())
}
