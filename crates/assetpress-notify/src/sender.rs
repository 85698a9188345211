//! Notification senders.

use crate::channels::*;
use assetpress_core::ports::{FailureNotifier, FailureReport};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Channel not configured: {0}")]
    NotConfigured(String),
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

impl From<NotifyError> for assetpress_core::Error {
    fn from(err: NotifyError) -> Self {
        assetpress_core::Error::Notification(err.to_string())
    }
}

async fn check_response(channel: &str, response: reqwest::Response) -> Result<(), NotifyError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(NotifyError::DeliveryFailed(format!(
            "{} returned {}: {}",
            channel, status, body
        )));
    }
    Ok(())
}

/// Writes the report to the log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl FailureNotifier for LogNotifier {
    async fn notify(&self, report: &FailureReport) -> assetpress_core::Result<()> {
        error!(
            job_id = %report.job_id,
            key = %report.key,
            job = %report.job_name,
            backend = %report.backend,
            error = %report.error,
            "{}",
            report.title()
        );
        Ok(())
    }
}

/// Slack notification sender.
pub struct SlackSender {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackSender {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn build_message(&self, report: &FailureReport) -> serde_json::Value {
        let mut message = serde_json::json!({
            "username": self.config.username,
            "icon_emoji": self.config.icon_emoji,
            "attachments": [{
                "color": "#dc3545",
                "title": report.title(),
                "text": report.body(),
                "fields": [
                    {"title": "Job", "value": report.job_name, "short": true},
                    {"title": "Backend", "value": report.backend, "short": true},
                ],
                "ts": report.occurred_at.timestamp()
            }]
        });
        if let Some(ref channel) = self.config.channel {
            message["channel"] = serde_json::Value::String(channel.clone());
        }
        message
    }

    async fn send(&self, report: &FailureReport) -> Result<(), NotifyError> {
        if self.config.webhook_url.is_empty() {
            return Err(NotifyError::NotConfigured("slack webhook_url".to_string()));
        }
        debug!(webhook = %self.config.webhook_url, "Sending Slack notification");

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&self.build_message(report))
            .send()
            .await?;
        check_response("Slack", response).await?;

        info!(job_id = %report.job_id, "Slack notification sent");
        Ok(())
    }
}

#[async_trait]
impl FailureNotifier for SlackSender {
    async fn notify(&self, report: &FailureReport) -> assetpress_core::Result<()> {
        Ok(self.send(report).await?)
    }
}

/// Posts the report as JSON to an arbitrary endpoint.
pub struct WebhookSender {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(config: WebhookConfig) -> Self {
        let timeout = config.timeout_seconds;
        Self {
            config,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout as u64))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn send(&self, report: &FailureReport) -> Result<(), NotifyError> {
        if self.config.url.is_empty() {
            return Err(NotifyError::NotConfigured("webhook url".to_string()));
        }
        debug!(url = %self.config.url, "Sending webhook notification");

        let mut request = match self.config.method {
            HttpMethod::Post => self.client.post(&self.config.url),
            HttpMethod::Put => self.client.put(&self.config.url),
        };

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        if let Some(ref auth) = self.config.auth {
            request = match auth.auth_type {
                AuthType::Bearer => request.bearer_auth(&auth.token),
                AuthType::Basic => request.basic_auth(&auth.token, None::<&str>),
            };
        }

        let response = request.json(report).send().await?;
        check_response("Webhook", response).await?;

        info!(job_id = %report.job_id, "Webhook notification sent");
        Ok(())
    }
}

#[async_trait]
impl FailureNotifier for WebhookSender {
    async fn notify(&self, report: &FailureReport) -> assetpress_core::Result<()> {
        Ok(self.send(report).await?)
    }
}

/// Delivers each report to every channel. One failing channel does not
/// stop the others; the first error is returned after all were tried.
pub struct FanoutNotifier {
    channels: Vec<Arc<dyn FailureNotifier>>,
}

impl FanoutNotifier {
    pub fn new(channels: Vec<Arc<dyn FailureNotifier>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl FailureNotifier for FanoutNotifier {
    async fn notify(&self, report: &FailureReport) -> assetpress_core::Result<()> {
        let mut first_error = None;
        for channel in &self.channels {
            if let Err(e) = channel.notify(report).await {
                warn!(job_id = %report.job_id, error = %e, "Notification channel failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Create the notifier for a configuration.
pub fn create_notifier(config: &NotifyConfig) -> Arc<dyn FailureNotifier> {
    let mut channels: Vec<Arc<dyn FailureNotifier>> = config
        .channels
        .iter()
        .map(|c| -> Arc<dyn FailureNotifier> {
            match c {
                ChannelConfig::Log => Arc::new(LogNotifier),
                ChannelConfig::Slack(s) => Arc::new(SlackSender::new(s.clone())),
                ChannelConfig::Webhook(w) => Arc::new(WebhookSender::new(w.clone())),
            }
        })
        .collect();

    match channels.len() {
        0 => Arc::new(LogNotifier),
        1 => channels.remove(0),
        _ => Arc::new(FanoutNotifier::new(channels)),
    }
}
