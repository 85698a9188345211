//! Failure notification channels for assetpress.
//!
//! Background compression jobs that fail outside debug mode report to
//! operators through a [`assetpress_core::ports::FailureNotifier`]. This
//! crate provides a log-only channel plus JSON webhook and Slack delivery.

pub mod channels;
pub mod sender;

pub use channels::{AuthType, ChannelConfig, HttpMethod, NotifyConfig, SlackConfig, WebhookAuth, WebhookConfig};
pub use sender::{FanoutNotifier, LogNotifier, NotifyError, SlackSender, WebhookSender, create_notifier};
