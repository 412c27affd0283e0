mod attribution;
mod config;
mod db;
mod errors;
mod models;
mod notify;
mod routes;
mod seed;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::notify::{
    AlertChannel, EmailAlertChannel, Notifier, WebhookAlertChannel, WhatsAppAlertChannel,
};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AdLift API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    init_schema(&db).await?;

    // Initialize alert channels (mocked email/WhatsApp + optional webhook)
    let notifier = build_notifier(&config);

    // Build app state
    let state = AppState { db, notifier };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Assembles the alert channel set from configuration.
fn build_notifier(config: &Config) -> Notifier {
    let mut channels: Vec<Arc<dyn AlertChannel>> = vec![
        Arc::new(EmailAlertChannel {
            to: config.alert_email_to.clone(),
        }),
        Arc::new(WhatsAppAlertChannel {
            to: config.alert_whatsapp_to.clone(),
        }),
    ];

    if let Some(url) = &config.alert_webhook_url {
        info!("Webhook alert channel enabled");
        channels.push(Arc::new(WebhookAlertChannel::new(url.clone())));
    }

    Notifier::new(channels)
}
