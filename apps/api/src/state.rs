use sqlx::PgPool;

use crate::notify::Notifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Alert fan-out sink. Mocked email/WhatsApp channels by default; a
    /// webhook channel joins when ALERT_WEBHOOK_URL is set.
    pub notifier: Notifier,
}
