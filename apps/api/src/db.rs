use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the campaign, event, airing, and result tables if absent.
///
/// Event and airing timestamps stay TEXT on purpose: upstream trackers
/// deliver mixed ISO-8601 forms, and a conversion with a garbage clock
/// string must still ingest (it is merely excluded from temporal
/// matching).
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            campaign_id TEXT PRIMARY KEY,
            name        TEXT,
            start_date  TEXT,
            end_date    TEXT,
            platforms   TEXT,
            tv_regions  TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id          UUID PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            event_type  TEXT NOT NULL,
            source      TEXT,
            referrer    TEXT,
            geo         TEXT,
            user_id     TEXT,
            revenue     DOUBLE PRECISION
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS airings (
            id          UUID PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            airing_time TEXT NOT NULL,
            channel     TEXT,
            region      TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only computation log. scores/weights/overall_score are NULL
    // for short-circuited (fully measured) runs.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attribution_results (
            id                   UUID PRIMARY KEY,
            campaign_id          TEXT NOT NULL,
            window_start         TIMESTAMPTZ NOT NULL,
            window_end           TIMESTAMPTZ NOT NULL,
            total_conversions    BIGINT NOT NULL,
            measured_conversions BIGINT NOT NULL,
            unattributed         BIGINT NOT NULL,
            scores               JSONB,
            weights              JSONB,
            overall_score        DOUBLE PRECISION,
            inferred_tv          DOUBLE PRECISION NOT NULL,
            confidence           DOUBLE PRECISION NOT NULL,
            computed_at          TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
