//! Slack incoming-webhook 渠道

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

use crate::config::SlackConfig;
use crate::notification::channel::{Notification, NotificationChannel, SendResult};
use crate::notification::color::color_meets_threshold;

/// Webhook 请求体
#[derive(Debug, Serialize)]
pub struct SlackPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    pub attachments: Vec<SlackAttachment<'a>>,
}

/// 带颜色的消息附件
#[derive(Debug, Serialize)]
pub struct SlackAttachment<'a> {
    pub color: &'static str,
    pub text: &'a str,
    pub fallback: &'a str,
    pub mrkdwn_in: [&'static str; 1],
}

/// Slack 渠道
pub struct SlackChannel {
    client: reqwest::blocking::Client,
    config: SlackConfig,
}

impl SlackChannel {
    /// 创建渠道，webhook_url 不能为空
    pub fn new(config: SlackConfig) -> Result<Self> {
        if config.webhook_url.is_empty() {
            anyhow::bail!("slack webhook_url is required");
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// 生成 webhook 请求体
    pub fn payload<'a>(&'a self, notification: &'a Notification) -> SlackPayload<'a> {
        SlackPayload {
            channel: self.config.channel.as_deref(),
            username: self.config.username.as_deref(),
            attachments: vec![SlackAttachment {
                color: notification.color.as_str(),
                text: &notification.text,
                fallback: &notification.text,
                mrkdwn_in: ["text"],
            }],
        }
    }
}

impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn should_send(&self, notification: &Notification) -> bool {
        color_meets_threshold(notification.color, self.config.min_color)
    }

    fn send(&self, notification: &Notification) -> Result<SendResult> {
        if !self.should_send(notification) {
            return Ok(SendResult::Skipped(format!(
                "color {} below threshold {}",
                notification.color, self.config.min_color
            )));
        }

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&self.payload(notification))
            .send()
            .context("Slack webhook request failed")?;

        let status = response.status();
        if status.is_success() {
            info!(
                channel = ?self.config.channel,
                color = %notification.color,
                "Notification sent to Slack"
            );
            Ok(SendResult::Sent)
        } else {
            let body = response.text().unwrap_or_default();
            error!(status = %status, body = %body, "Slack rejected notification");
            Ok(SendResult::Failed(format!("HTTP {}: {}", status, body)))
        }
    }
}
