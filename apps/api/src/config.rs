use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails fast if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Recipient for the mocked email alert channel.
    pub alert_email_to: String,
    /// Recipient for the mocked WhatsApp alert channel.
    pub alert_whatsapp_to: String,
    /// Optional webhook URL; when set, summaries are POSTed there too.
    pub alert_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            alert_email_to: std::env::var("ALERT_EMAIL_TO")
                .unwrap_or_else(|_| "client@example.com".to_string()),
            alert_whatsapp_to: std::env::var("ALERT_WHATSAPP_TO")
                .unwrap_or_else(|_| "+910000000000".to_string()),
            alert_webhook_url: std::env::var("ALERT_WEBHOOK_URL").ok(),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
