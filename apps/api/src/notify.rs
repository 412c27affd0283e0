//! Alert fan-out: delivery channels behind one boundary so a real sender
//! can replace the mocked ones without touching the scoring pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

/// One delivery channel for attribution summaries.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, summary: &str) -> Result<()>;
}

/// Mocked email sender: logs the alert instead of delivering it. Swapping
/// in an SMTP or API-backed sender is a drop-in change here.
pub struct EmailAlertChannel {
    pub to: String,
}

#[async_trait]
impl AlertChannel for EmailAlertChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, summary: &str) -> Result<()> {
        info!(
            "[email alert] to={} subject=\"Campaign Update\" body={summary}",
            self.to
        );
        Ok(())
    }
}

/// Mocked WhatsApp sender: logs the alert instead of delivering it.
pub struct WhatsAppAlertChannel {
    pub to: String,
}

#[async_trait]
impl AlertChannel for WhatsAppAlertChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn send(&self, summary: &str) -> Result<()> {
        info!("[whatsapp alert] to={} message={summary}", self.to);
        Ok(())
    }
}

/// Posts summaries to a configured webhook as `{"text": ...}` (the shape
/// Slack-compatible incoming webhooks accept).
pub struct WebhookAlertChannel {
    url: String,
    client: Client,
}

impl WebhookAlertChannel {
    pub fn new(url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { url, client }
    }
}

#[async_trait]
impl AlertChannel for WebhookAlertChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, summary: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": summary }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("webhook returned status {}", response.status());
        }
        Ok(())
    }
}

/// Fans one summary out to every configured channel.
///
/// Delivery is best-effort: a failing channel is logged and skipped, and
/// the remaining channels still receive the summary. A dead webhook must
/// never block result persistence or the API response.
#[derive(Clone)]
pub struct Notifier {
    channels: Vec<Arc<dyn AlertChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self { channels }
    }

    pub async fn notify(&self, summary: &str) {
        for channel in &self.channels {
            if let Err(e) = channel.send(summary).await {
                warn!("Alert delivery via {} failed: {e}", channel.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingChannel {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AlertChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, summary: &str) -> Result<()> {
            self.delivered.lock().unwrap().push(summary.to_string());
            Ok(())
        }
    }

    struct FailingChannel;

    #[async_trait]
    impl AlertChannel for FailingChannel {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _summary: &str) -> Result<()> {
            anyhow::bail!("channel down")
        }
    }

    #[tokio::test]
    async fn test_notify_delivers_to_all_channels() {
        let recorder = Arc::new(RecordingChannel {
            delivered: Mutex::new(Vec::new()),
        });
        let notifier = Notifier::new(vec![recorder.clone() as Arc<dyn AlertChannel>]);

        notifier.notify("Inferred TV conversions: 5.556 (confidence 0.36)").await;

        let delivered = recorder.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].contains("5.556"));
    }

    #[tokio::test]
    async fn test_notify_swallows_channel_failures() {
        let recorder = Arc::new(RecordingChannel {
            delivered: Mutex::new(Vec::new()),
        });
        let notifier = Notifier::new(vec![
            Arc::new(FailingChannel) as Arc<dyn AlertChannel>,
            recorder.clone(),
        ]);

        // Must not panic, and the healthy channel still gets the summary.
        notifier.notify("summary").await;

        assert_eq!(recorder.delivered.lock().unwrap().len(), 1);
    }
}
