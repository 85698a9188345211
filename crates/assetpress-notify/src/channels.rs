//! Notification channel configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Notifier configuration: every listed channel receives each report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub channels: Vec<ChannelConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channels: vec![ChannelConfig::Log],
        }
    }
}

/// Channel-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Emit the report as an error-level log event.
    Log,
    Slack(SlackConfig),
    Webhook(WebhookConfig),
}

/// Slack incoming-webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub channel: Option<String>,
    pub username: String,
    pub icon_emoji: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            channel: None,
            username: "assetpress".to_string(),
            icon_emoji: ":warning:".to_string(),
        }
    }
}

/// Generic JSON webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub auth: Option<WebhookAuth>,
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAuth {
    pub auth_type: AuthType,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    Bearer,
    Basic,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            auth: None,
            timeout_seconds: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_log_only() {
        let config = NotifyConfig::default();
        assert!(matches!(config.channels.as_slice(), [ChannelConfig::Log]));
    }

    #[test]
    fn test_channels_from_yaml() {
        let yaml = r#"
channels:
  - type: log
  - type: webhook
    url: https://ops.example.com/hooks/assets
    method: PUT
    auth:
      auth_type: bearer
      token: s3cret
  - type: slack
    webhook_url: https://hooks.slack.com/services/T/B/X
"#;
        let config: NotifyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.channels.len(), 3);
        match &config.channels[1] {
            ChannelConfig::Webhook(w) => {
                assert_eq!(w.method, HttpMethod::Put);
                assert_eq!(w.timeout_seconds, 10);
                assert_eq!(w.auth.as_ref().map(|a| a.auth_type), Some(AuthType::Bearer));
            }
            other => panic!("unexpected channel: {other:?}"),
        }
        match &config.channels[2] {
            ChannelConfig::Slack(s) => assert_eq!(s.username, "assetpress"),
            other => panic!("unexpected channel: {other:?}"),
        }
    }
}
